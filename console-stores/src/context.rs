//! The object consumers receive instead of reaching for global stores.

use std::sync::Arc;

use reqwest::cookie::Jar;
use shared::config::ClientConfig;
use tracing::debug;

use crate::{
    application_info::ApplicationInfoStore,
    authentication::AuthenticationStore,
    cookies::{CookieSource, JarCookieSource},
    error::StoreResult,
    transport::{HttpTransport, ReqwestTransport},
};

/// Both stores, wired to one transport and one cookie source.
#[derive(Debug, Clone)]
pub struct StoreContext {
    authentication: AuthenticationStore,
    application_info: ApplicationInfoStore,
}

impl StoreContext {
    /// Builds fresh stores over the given collaborators.
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>, cookies: Arc<dyn CookieSource>) -> Self {
        Self {
            authentication: AuthenticationStore::new(Arc::clone(&transport), cookies),
            application_info: ApplicationInfoStore::new(transport),
        }
    }

    /// Builds a context that talks to `config.base_url` through `reqwest`, keeping
    /// session cookies in `jar` and reading the XSRF token from the same jar.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    pub fn connect(config: &ClientConfig, jar: Arc<Jar>) -> StoreResult<Self> {
        let origin = config.origin()?;
        let transport = ReqwestTransport::from_config(config, Arc::clone(&jar))?;
        let cookies = JarCookieSource::new(jar, origin);
        debug!(base_url = %config.base_url, "store context connected");

        let mut context = Self::new(Arc::new(transport), Arc::new(cookies));
        context.authentication = context
            .authentication
            .with_xsrf_names(&config.xsrf_cookie_name, &config.xsrf_header_name);
        Ok(context)
    }

    /// The authentication store.
    #[must_use]
    pub fn authentication(&self) -> &AuthenticationStore {
        &self.authentication
    }

    /// The application-info store.
    #[must_use]
    pub fn application_info(&self) -> &ApplicationInfoStore {
        &self.application_info
    }

    /// Resets both stores to their initial snapshots.
    pub fn reset_all(&self) {
        self.authentication.reset();
        self.application_info.reset();
    }
}
