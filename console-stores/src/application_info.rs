//! Server-reported feature configuration.
//!
//! SYSTEM CONTEXT
//! ==============
//! Fetched once at startup from `/actuator/info` and read by feature gates (copilot,
//! analytics, help hub, sign-up) throughout the UI.
//!
//! FAILED FETCHES
//! ==============
//! A non-200 response leaves `loading = true`. Every later
//! [`ApplicationInfoStore::get_application_info`] call is then a guarded no-op until
//! [`ApplicationInfoStore::reset`].

#[cfg(test)]
#[path = "application_info_test.rs"]
mod application_info_test;

use std::{collections::BTreeMap, fmt, sync::Arc};

use http::StatusCode;
use serde::Serialize;
use shared::models::{
    Ai, Analytics, Application, ApplicationInfoPayload, Edition, HelpHub, SignUp,
    TemplatesSubmissionForm, parse_flag,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    error::{StoreError, StoreResult},
    store::Store,
    transport::{HttpRequest, HttpTransport},
};

/// Endpoint serving the application info document.
pub const APPLICATION_INFO_PATH: &str = "/actuator/info";

/// Snapshot held by the [`ApplicationInfoStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplicationInfoState {
    /// True while a fetch is in flight (and, after a failed fetch, until reset).
    pub loading: bool,
    /// AI features.
    pub ai: Ai,
    /// Product analytics.
    pub analytics: Analytics,
    /// Application metadata; `None` until a successful fetch reports it.
    pub application: Option<Application>,
    /// Named feature toggles.
    pub feature_flags: BTreeMap<String, bool>,
    /// In-app help.
    pub help_hub: HelpHub,
    /// Self-service registration.
    pub sign_up: SignUp,
    /// Template submission links.
    pub templates_submission_form: TemplatesSubmissionForm,
}

impl ApplicationInfoState {
    /// Whether the named feature flag is on. Unknown flags are off.
    #[must_use]
    pub fn feature_enabled(&self, name: &str) -> bool {
        self.feature_flags.get(name).copied().unwrap_or(false)
    }

    /// The reported edition, if any.
    #[must_use]
    pub fn edition(&self) -> Option<Edition> {
        self.application.map(|application| application.edition)
    }

    /// Merges a payload into the snapshot. Sections the payload omits are left alone.
    fn apply(&mut self, payload: ApplicationInfoPayload) {
        if let Some(ai) = payload.ai {
            self.ai.copilot.enabled = ai.copilot.is_some_and(|copilot| copilot.enabled());
        }

        if let Some(analytics) = payload.analytics {
            self.analytics.enabled = parse_flag(analytics.enabled.as_ref());
            if let Some(post_hog) = analytics.post_hog {
                self.analytics.post_hog = post_hog;
            }
        }

        if let Some(application) = payload.application {
            self.application = Some(Application {
                edition: application.edition.unwrap_or(Edition::Unknown),
            });
        }

        if let Some(feature_flags) = payload.feature_flags {
            self.feature_flags = feature_flags;
        }

        if let Some(help_hub) = payload.help_hub {
            self.help_hub.enabled = parse_flag(help_hub.enabled.as_ref());
            if let Some(command_bar) = help_hub.command_bar {
                self.help_hub.command_bar = command_bar;
            }
        }

        if let Some(sign_up) = payload.sign_up {
            self.sign_up = sign_up;
        }

        if let Some(form) = payload.templates_submission_form {
            self.templates_submission_form = form;
        }
    }
}

/// Holds the application info snapshot and fetches it from the server.
#[derive(Clone)]
pub struct ApplicationInfoStore {
    state: Arc<Store<ApplicationInfoState>>,
    transport: Arc<dyn HttpTransport>,
}

impl fmt::Debug for ApplicationInfoStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationInfoStore")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl ApplicationInfoStore {
    /// Creates a store in its initial state.
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            state: Arc::new(Store::new(ApplicationInfoState::default())),
            transport,
        }
    }

    /// Fetches `/actuator/info` and commits the converted payload.
    ///
    /// Returns immediately, without a request, while another fetch holds the guard. On a
    /// non-200 status nothing is committed and `loading` stays `true`.
    ///
    /// # Errors
    /// Returns [`StoreError::Transport`] when no response arrives and
    /// [`StoreError::Decode`] when a 200 body does not decode. Both release the guard
    /// and leave every other field untouched.
    pub async fn get_application_info(&self) -> StoreResult<()> {
        if !self.state.try_begin(begin_loading) {
            debug!(
                path = APPLICATION_INFO_PATH,
                "application info fetch already in flight; skipping"
            );
            return Ok(());
        }

        match self.fetch().await {
            Ok(Some(payload)) => {
                self.state.set_state(|state| {
                    state.apply(payload);
                    state.loading = false;
                });
                info!(
                    edition = ?self.state.with_state(ApplicationInfoState::edition),
                    "application info loaded"
                );
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(err) => {
                self.state.set_state(|state| state.loading = false);
                warn!(error = %err, "application info fetch failed");
                Err(err)
            }
        }
    }

    async fn fetch(&self) -> StoreResult<Option<ApplicationInfoPayload>> {
        let response = self
            .transport
            .request(HttpRequest::get(APPLICATION_INFO_PATH))
            .await?;

        if response.status != StatusCode::OK {
            warn!(
                status = response.status.as_u16(),
                "application info request rejected; loading stays set until reset"
            );
            return Ok(None);
        }

        response
            .json()
            .map(Some)
            .map_err(|source| StoreError::decode(APPLICATION_INFO_PATH, source))
    }

    /// A copy of the current snapshot.
    #[must_use]
    pub fn get_state(&self) -> ApplicationInfoState {
        self.state.get_state()
    }

    /// Applies a partial update to the snapshot.
    pub fn set_state(&self, update: impl FnOnce(&mut ApplicationInfoState)) {
        self.state.set_state(update);
    }

    /// Replaces the whole snapshot.
    pub fn replace_state(&self, state: ApplicationInfoState) {
        self.state.replace_state(state);
    }

    /// Restores the initial snapshot. An in-flight request is not cancelled.
    pub fn reset(&self) {
        self.state.reset();
    }

    /// A receiver notified after every commit.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ApplicationInfoState> {
        self.state.subscribe()
    }
}

fn begin_loading(state: &mut ApplicationInfoState) -> bool {
    if state.loading {
        return false;
    }
    state.loading = true;
    true
}
