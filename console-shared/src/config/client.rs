use serde::{Deserialize, Serialize};
use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};
use thiserror::Error;
use tracing::debug;
use url::Url;

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_USER_AGENT: &str = "console-cli";
const DEFAULT_XSRF_COOKIE: &str = "XSRF-TOKEN";
const DEFAULT_XSRF_HEADER: &str = "X-XSRF-TOKEN";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Errors raised while resolving a [`ClientConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file could not be parsed.
    #[error("failed to parse configuration file {path}: {message}")]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Parser diagnostic.
        message: String,
    },

    /// The file extension is not one of `yaml`, `yml`, `json`, `toml`.
    #[error("unsupported configuration format {0:?}; use yaml, json, or toml")]
    UnsupportedFormat(String),

    /// An environment override could not be parsed.
    #[error("invalid {key} value: {message}")]
    InvalidEnv {
        /// Environment variable name.
        key: &'static str,
        /// What was wrong with it.
        message: String,
    },

    /// The resolved configuration failed validation.
    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format {other:?}")),
        }
    }
}

/// Logging settings for the command-line front end.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level directive, overridable through `RUST_LOG`.
    pub level: String,
    /// Line format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Configuration for talking to the console API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// Origin of the console API, e.g. `http://localhost:8080`.
    pub base_url: String,

    /// Per-request timeout enforced by the transport.
    pub request_timeout_secs: u64,

    /// `User-Agent` sent with every request.
    pub user_agent: String,

    /// Cookie carrying the anti-forgery token.
    pub xsrf_cookie_name: String,

    /// Header the anti-forgery token is echoed in.
    pub xsrf_header_name: String,

    /// Logging settings.
    pub logging: LoggingConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ClientConfig {
    /// Generates a default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            xsrf_cookie_name: DEFAULT_XSRF_COOKIE.to_string(),
            xsrf_header_name: DEFAULT_XSRF_HEADER.to_string(),
            logging: LoggingConfig::default(),
        }
    }

    /// Loads the configuration from a file, environment variables, or defaults.
    ///
    /// Values set in the file win over environment variables; `base_url_override`
    /// wins over both.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, an environment override is
    /// malformed, or the result fails [`ClientConfig::validate`].
    pub fn load_config(
        config_path: Option<PathBuf>,
        base_url_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        Self::load_config_with_env(config_path, base_url_override, |key| env::var(key).ok())
    }

    /// Same as [`ClientConfig::load_config`] with an explicit environment lookup.
    ///
    /// # Errors
    /// See [`ClientConfig::load_config`].
    pub fn load_config_with_env<F>(
        config_path: Option<PathBuf>,
        base_url_override: Option<String>,
        lookup: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::with_defaults();
        let mut config = match config_path {
            Some(path) => Self::from_file(&path)?,
            None => defaults.clone(),
        };

        // Environment only fills values the file left at their defaults.
        if config.base_url == defaults.base_url {
            if let Some(base_url) = lookup("CONSOLE_BASE_URL") {
                config.base_url = base_url;
            }
        }
        if config.request_timeout_secs == defaults.request_timeout_secs {
            if let Some(timeout) = lookup("CONSOLE_REQUEST_TIMEOUT_SECS") {
                config.request_timeout_secs =
                    timeout.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                        key: "CONSOLE_REQUEST_TIMEOUT_SECS",
                        message: format!("{timeout:?} is not a whole number of seconds"),
                    })?;
            }
        }
        if config.logging.level == defaults.logging.level {
            if let Some(level) = lookup("CONSOLE_LOG_LEVEL") {
                config.logging.level = level;
            }
        }
        if config.logging.format == defaults.logging.format {
            if let Some(format) = lookup("CONSOLE_LOG_FORMAT") {
                config.logging.format =
                    format
                        .parse()
                        .map_err(|message| ConfigError::InvalidEnv {
                            key: "CONSOLE_LOG_FORMAT",
                            message,
                        })?;
            }
        }

        if let Some(base_url) = base_url_override {
            config.base_url = base_url;
        }

        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "loading configuration file");
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let parse_error = |message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        };

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => {
                serde_yml::from_str(&content).map_err(|err| parse_error(err.to_string()))
            }
            Some("json") => {
                serde_json::from_str(&content).map_err(|err| parse_error(err.to_string()))
            }
            Some("toml") => toml::from_str(&content).map_err(|err| parse_error(err.to_string())),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    /// Validates the configuration, collecting every problem found.
    ///
    /// # Errors
    /// Returns the list of validation messages when anything is wrong.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        match Url::parse(&self.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(format!(
                "base_url must use http or https, got {}",
                url.scheme()
            )),
            Err(err) => errors.push(format!("base_url {:?} is not a URL: {err}", self.base_url)),
        }

        if self.request_timeout_secs == 0 {
            errors.push("request_timeout_secs must be greater than 0".to_string());
        }
        if self.xsrf_cookie_name.trim().is_empty() {
            errors.push("xsrf_cookie_name must not be empty".to_string());
        }
        if self.xsrf_header_name.trim().is_empty() {
            errors.push("xsrf_header_name must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// The API origin as a parsed URL.
    ///
    /// # Errors
    /// Returns an error if `base_url` is not a valid URL.
    pub fn origin(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.base_url)
            .map_err(|err| ConfigError::Invalid(vec![format!("base_url: {err}")]))
    }

    /// The request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
