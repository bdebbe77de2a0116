//! Client-side state stores for the console API.
//!
//! SYSTEM CONTEXT
//! ==============
//! UI consumers never talk to the API directly. They hold a [`StoreContext`], read
//! snapshots from its two stores, and trigger actions that perform the HTTP calls and
//! commit new snapshots:
//!
//! - [`AuthenticationStore`]: session and account lifecycle (`get_account`, `login`,
//!   `logout`, `clear_authentication`, `reset`).
//! - [`ApplicationInfoStore`]: one-shot fetch of the server-reported feature
//!   configuration (`get_application_info`, `reset`).
//!
//! CONCURRENCY
//! ===========
//! Each store carries a `loading` flag that acts as an advisory in-flight guard. The
//! check-and-set happens in a single snapshot update, so two callers cannot both pass
//! it. Snapshots are never borrowed across an await point.

pub mod application_info;
pub mod authentication;
pub mod context;
pub mod cookies;
pub mod error;
pub mod store;
pub mod transport;

pub use application_info::{APPLICATION_INFO_PATH, ApplicationInfoState, ApplicationInfoStore};
pub use authentication::{
    ACCOUNT_PATH, AUTHENTICATION_PATH, AuthenticationState, AuthenticationStore, LOGOUT_PATH,
};
pub use context::StoreContext;
pub use cookies::{CookieSource, JarCookieSource};
pub use error::{StoreError, StoreResult};
pub use store::Store;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};
