//! HTTP transport seam.
//!
//! The stores only see status codes and bodies. Everything below that (connection
//! handling, cookies, timeouts) belongs to the [`HttpTransport`] implementation; the
//! production one is [`ReqwestTransport`].
//!
//! ERROR HANDLING
//! ==============
//! A non-2xx status is a successful transport call. Only failures to get a complete
//! response at all come back as [`TransportError`].

#[cfg(test)]
#[path = "transport_test.rs"]
mod transport_test;

use std::sync::Arc;

use async_trait::async_trait;
use http::{Method, StatusCode, header};
use reqwest::{Client, cookie::Jar};
use serde::de::DeserializeOwned;
use shared::config::ClientConfig;
use thiserror::Error;
use tracing::debug;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Transport-level failures.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request never produced a complete response.
    #[error("request {method} {path} failed: {source}")]
    Request {
        /// Request method.
        method: Method,
        /// Request path.
        path: String,
        /// Underlying client failure.
        #[source]
        source: reqwest::Error,
    },

    /// The peer could not be reached or hung up; used by non-reqwest transports.
    #[error("connection failed: {0}")]
    Connection(String),
}

/// A request as the stores describe it: method, API path, headers, optional body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Request method.
    pub method: Method,
    /// Path relative to the API origin, e.g. `/api/account`.
    pub path: String,
    /// Extra headers in insertion order.
    pub headers: Vec<(String, String)>,
    /// Encoded body.
    pub body: Option<String>,
}

impl HttpRequest {
    /// A request with no headers and no body.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// A `GET` request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// A `POST` request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets a URL-encoded form body and the matching content type.
    #[must_use]
    pub fn form(self, fields: &[(&str, &str)]) -> Self {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let mut request = self.header(header::CONTENT_TYPE.as_str(), FORM_CONTENT_TYPE);
        request.body = Some(body);
        request
    }

    /// First value of the named header, compared case-insensitively.
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A fully read response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Response status.
    pub status: StatusCode,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// A response with the given body.
    #[must_use]
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// A response without a body.
    #[must_use]
    pub fn empty(status: StatusCode) -> Self {
        Self::new(status, Vec::new())
    }

    /// A response whose body is the given JSON document.
    #[must_use]
    pub fn with_json(status: StatusCode, value: &serde_json::Value) -> Self {
        Self::new(status, value.to_string())
    }

    /// Whether the status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Whether the body holds nothing but whitespace.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    /// Returns the decoder error when the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Sends requests to the console API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends `request` and returns the complete response, whatever its status.
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// [`HttpTransport`] backed by a `reqwest` client and its cookie jar.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    base_url: String,
    client: Client,
}

impl ReqwestTransport {
    /// Wraps an existing client; paths are resolved against `base_url`.
    #[must_use]
    pub fn new(base_url: &str, client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Builds a client that stores cookies in `jar` and applies the configured user
    /// agent and timeout.
    ///
    /// # Errors
    /// Returns an error if the underlying client cannot be built.
    pub fn from_config(config: &ClientConfig, jar: Arc<Jar>) -> Result<Self, TransportError> {
        let client = Client::builder()
            .cookie_provider(jar)
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout())
            .build()
            .map_err(TransportError::Client)?;
        Ok(Self::new(&config.base_url, client))
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let HttpRequest {
            method,
            path,
            headers,
            body,
        } = request;

        let mut builder = self.client.request(method.clone(), self.api_url(&path));
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let failed = |source| TransportError::Request {
            method: method.clone(),
            path: path.clone(),
            source,
        };
        let response = builder.send().await.map_err(failed)?;
        let status = response.status();
        let body = response.bytes().await.map_err(failed)?;

        debug!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            bytes = body.len(),
            "response received"
        );
        Ok(HttpResponse::new(status, body.to_vec()))
    }
}
