//! # Store errors
//!
//! HTTP failures (non-2xx) are not errors; the stores fold them into state flags.
//! What surfaces here is everything that stops an action from producing a response
//! it can interpret.

use shared::config::ConfigError;
use thiserror::Error;

use crate::transport::TransportError;

/// Result type alias for store actions.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures surfaced by store actions.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The transport rejected the request (network failure, unreadable response).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A success response carried a body that does not match the expected shape.
    #[error("failed to decode {endpoint} response: {source}")]
    Decode {
        /// Endpoint whose body failed to decode.
        endpoint: &'static str,
        /// Decoder diagnostic.
        #[source]
        source: serde_json::Error,
    },

    /// The client configuration could not be turned into a working context.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl StoreError {
    pub(crate) fn decode(endpoint: &'static str, source: serde_json::Error) -> Self {
        Self::Decode { endpoint, source }
    }
}
