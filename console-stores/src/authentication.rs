//! Session and account state for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Route guards read `authenticated` / `session_has_been_fetched`; the login form
//! reads `show_login` / `login_error`. Nothing else writes this state.
//!
//! State machine: Anonymous -> (account fetch or login succeeds) -> Authenticated ->
//! (logout or clear) -> Anonymous. A failed login sets `login_error` while staying
//! anonymous; the next accepted credential step clears it.

#[cfg(test)]
#[path = "authentication_test.rs"]
mod authentication_test;

use std::{fmt, sync::Arc};

use serde::Serialize;
use serde_json::Value;
use shared::{config::ClientConfig, models::Account};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    cookies::CookieSource,
    error::{StoreError, StoreResult},
    store::Store,
    transport::{HttpRequest, HttpResponse, HttpTransport},
};

/// Endpoint returning the current account.
pub const ACCOUNT_PATH: &str = "/api/account";
/// Endpoint accepting form-encoded credentials.
pub const AUTHENTICATION_PATH: &str = "/api/authentication";
/// Endpoint ending the session.
pub const LOGOUT_PATH: &str = "/api/logout";

/// Snapshot held by the [`AuthenticationStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthenticationState {
    /// The signed-in account, `None` while anonymous.
    pub account: Option<Account>,
    /// True only after a successful account fetch or login.
    pub authenticated: bool,
    /// In-flight guard for account fetches.
    pub loading: bool,
    /// Set by a rejected login, cleared by the next accepted one.
    pub login_error: bool,
    /// True once an account fetch has completed, whatever its outcome.
    pub session_has_been_fetched: bool,
    /// Whether the UI should present the login form.
    pub show_login: bool,
}

#[derive(Debug, Clone)]
struct XsrfNames {
    cookie: String,
    header: String,
}

impl Default for XsrfNames {
    fn default() -> Self {
        let config = ClientConfig::with_defaults();
        Self {
            cookie: config.xsrf_cookie_name,
            header: config.xsrf_header_name,
        }
    }
}

enum AccountLookup {
    Found(Account),
    Anonymous,
}

/// Holds the authentication snapshot and drives the session endpoints.
#[derive(Clone)]
pub struct AuthenticationStore {
    state: Arc<Store<AuthenticationState>>,
    transport: Arc<dyn HttpTransport>,
    cookies: Arc<dyn CookieSource>,
    xsrf: XsrfNames,
}

impl fmt::Debug for AuthenticationStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticationStore")
            .field("state", &self.state)
            .field("xsrf", &self.xsrf)
            .finish_non_exhaustive()
    }
}

impl AuthenticationStore {
    /// Creates a store in its initial state using the default XSRF cookie and header.
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>, cookies: Arc<dyn CookieSource>) -> Self {
        Self {
            state: Arc::new(Store::new(AuthenticationState::default())),
            transport,
            cookies,
            xsrf: XsrfNames::default(),
        }
    }

    /// Overrides the cookie the token is read from and the header it is echoed in.
    #[must_use]
    pub fn with_xsrf_names(mut self, cookie: impl Into<String>, header: impl Into<String>) -> Self {
        self.xsrf = XsrfNames {
            cookie: cookie.into(),
            header: header.into(),
        };
        self
    }

    /// Fetches the current account.
    ///
    /// Returns `Ok(None)` without a request while another fetch holds the guard, and
    /// `Ok(None)` when the server reports no session (non-2xx, or a 2xx with an empty
    /// body). Both outcomes other than the guard mark the session as fetched.
    ///
    /// # Errors
    /// Transport and decode failures propagate after the guard is released; nothing
    /// else changes.
    pub async fn get_account(&self) -> StoreResult<Option<Account>> {
        self.check_session(true).await
    }

    /// Runs the guarded account fetch. With `adopt_account` unset a returned account is
    /// not committed and the snapshot ends anonymous either way.
    async fn check_session(&self, adopt_account: bool) -> StoreResult<Option<Account>> {
        if !self.state.try_begin(begin_loading) {
            debug!(path = ACCOUNT_PATH, "account fetch already in flight; skipping");
            return Ok(None);
        }

        match self.fetch_account().await {
            Ok(AccountLookup::Found(account)) if adopt_account => {
                info!(account_id = ?account.id, "session established");
                self.state.set_state(|state| {
                    state.account = Some(account.clone());
                    state.authenticated = true;
                    state.loading = false;
                    state.session_has_been_fetched = true;
                });
                Ok(Some(account))
            }
            Ok(lookup) => {
                if matches!(lookup, AccountLookup::Found(_)) {
                    warn!("server still reports a session after logout; keeping it signed out");
                }
                self.state.set_state(|state| {
                    state.account = None;
                    state.authenticated = false;
                    state.loading = false;
                    state.session_has_been_fetched = true;
                    state.show_login = true;
                });
                Ok(None)
            }
            Err(err) => {
                self.state.set_state(|state| state.loading = false);
                warn!(error = %err, "account fetch failed");
                Err(err)
            }
        }
    }

    async fn fetch_account(&self) -> StoreResult<AccountLookup> {
        let request = self.with_xsrf(HttpRequest::get(ACCOUNT_PATH));
        let response = self.transport.request(request).await?;

        if !response.is_success() {
            debug!(status = response.status.as_u16(), "no active session");
            return Ok(AccountLookup::Anonymous);
        }

        decode_account(&response)
    }

    /// Submits credentials, then loads the account.
    ///
    /// The credential `POST` and the account `GET` are issued strictly in that order.
    /// A rejected credential step sets `login_error` and stops before the second request.
    ///
    /// # Errors
    /// Transport and decode failures propagate. A failure in the credential step leaves
    /// the state untouched; a failure in the account step shows the login form again.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        remember_me: bool,
    ) -> StoreResult<Option<Account>> {
        let request = self.with_xsrf(HttpRequest::post(AUTHENTICATION_PATH).form(&[
            ("username", username),
            ("password", password),
            ("rememberMe", if remember_me { "true" } else { "false" }),
        ]));

        debug!(username, remember_me, "submitting credentials");
        let response = self.transport.request(request).await?;

        if !response.is_success() {
            warn!(status = response.status.as_u16(), "credentials rejected");
            self.state.set_state(|state| {
                state.login_error = true;
                state.show_login = true;
                state.authenticated = false;
            });
            return Ok(None);
        }

        self.state.set_state(|state| {
            state.login_error = false;
            state.show_login = false;
        });

        let outcome = self.get_account().await;
        if outcome.is_err() {
            self.state.set_state(|state| state.show_login = true);
        }
        outcome
    }

    /// Ends the session on the server, clears the local account, then re-checks the
    /// session.
    ///
    /// The store ends anonymous whatever the logout status; an account returned by the
    /// re-check is discarded.
    ///
    /// # Errors
    /// A transport failure on the logout request propagates with the state untouched;
    /// a failure during the re-check propagates after the local clear.
    pub async fn logout(&self) -> StoreResult<()> {
        let request = self.with_xsrf(HttpRequest::post(LOGOUT_PATH));
        let response = self.transport.request(request).await?;
        debug!(status = response.status.as_u16(), "logout acknowledged");

        self.state.set_state(|state| {
            state.account = None;
            state.authenticated = false;
            state.show_login = true;
        });
        info!("signed out");

        self.check_session(false).await.map(|_| ())
    }

    /// Drops the session locally after the client detected it is no longer valid
    /// (e.g. a 401 from an unrelated call). No request is made.
    pub fn clear_authentication(&self) {
        self.state.set_state(|state| {
            state.authenticated = false;
            state.loading = false;
            state.show_login = true;
        });
    }

    /// Restores the initial snapshot. An in-flight request is not cancelled.
    pub fn reset(&self) {
        self.state.reset();
    }

    /// A copy of the current snapshot.
    #[must_use]
    pub fn get_state(&self) -> AuthenticationState {
        self.state.get_state()
    }

    /// Applies a partial update to the snapshot.
    pub fn set_state(&self, update: impl FnOnce(&mut AuthenticationState)) {
        self.state.set_state(update);
    }

    /// Replaces the whole snapshot.
    pub fn replace_state(&self, state: AuthenticationState) {
        self.state.replace_state(state);
    }

    /// A receiver notified after every commit.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthenticationState> {
        self.state.subscribe()
    }

    fn with_xsrf(&self, request: HttpRequest) -> HttpRequest {
        match self.cookies.get_cookie(&self.xsrf.cookie) {
            Some(token) if !token.is_empty() => request.header(self.xsrf.header.clone(), token),
            _ => request,
        }
    }
}

fn begin_loading(state: &mut AuthenticationState) -> bool {
    if state.loading {
        return false;
    }
    state.loading = true;
    true
}

/// A 2xx with nothing in it (`""`, `null`, `{}`) means "no session".
fn decode_account(response: &HttpResponse) -> StoreResult<AccountLookup> {
    if response.is_blank() {
        return Ok(AccountLookup::Anonymous);
    }

    let body: Value = response
        .json()
        .map_err(|source| StoreError::decode(ACCOUNT_PATH, source))?;
    let empty = match &body {
        Value::Null => true,
        Value::Object(fields) => fields.is_empty(),
        _ => false,
    };
    if empty {
        return Ok(AccountLookup::Anonymous);
    }

    serde_json::from_value(body)
        .map(AccountLookup::Found)
        .map_err(|source| StoreError::decode(ACCOUNT_PATH, source))
}
