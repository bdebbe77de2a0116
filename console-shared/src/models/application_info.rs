//! Application info as reported by `GET /actuator/info`.
//!
//! The server reports several booleans as the strings `"true"` / `"false"`. The
//! `*Payload` types mirror the wire shape; the plain section types are what the
//! application-info store keeps once those flags have been converted.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Converts a stringly-typed wire flag into a boolean.
///
/// Only the exact string `"true"` is true. Missing values, other strings, and values of
/// any other JSON type are false.
#[must_use]
pub fn parse_flag(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::String(flag)) if flag == "true")
}

/// Product tier reported by the server.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Edition {
    /// Community edition.
    #[serde(rename = "CE")]
    Ce,
    /// Enterprise edition.
    #[serde(rename = "EE")]
    Ee,
    /// Any tier this client does not know about.
    #[serde(other)]
    Unknown,
}

impl Edition {
    /// Wire representation of the edition.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ce => "CE",
            Self::Ee => "EE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Edition {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value {
            "CE" => Self::Ce,
            "EE" => Self::Ee,
            _ => Self::Unknown,
        })
    }
}

/// Raw `/actuator/info` body. Absent sections leave the stored values untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicationInfoPayload {
    /// AI features.
    pub ai: Option<AiPayload>,
    /// Product analytics.
    pub analytics: Option<AnalyticsPayload>,
    /// Application metadata.
    pub application: Option<ApplicationPayload>,
    /// Named feature toggles.
    pub feature_flags: Option<BTreeMap<String, bool>>,
    /// In-app help.
    pub help_hub: Option<HelpHubPayload>,
    /// Self-service registration.
    pub sign_up: Option<SignUp>,
    /// Template submission links.
    pub templates_submission_form: Option<TemplatesSubmissionForm>,
}

/// A wire section whose only member is a string `enabled` flag.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FlagPayload {
    /// `"true"` / `"false"` as sent by the server.
    pub enabled: Option<Value>,
}

impl FlagPayload {
    /// The converted flag.
    #[must_use]
    pub fn enabled(&self) -> bool {
        parse_flag(self.enabled.as_ref())
    }
}

/// Wire shape of the `ai` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AiPayload {
    /// Copilot toggle.
    pub copilot: Option<FlagPayload>,
}

/// Wire shape of the `analytics` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyticsPayload {
    /// `"true"` / `"false"` as sent by the server.
    pub enabled: Option<Value>,
    /// PostHog connection settings.
    pub post_hog: Option<PostHog>,
}

/// Wire shape of the `application` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApplicationPayload {
    /// Reported product tier.
    pub edition: Option<Edition>,
}

/// Wire shape of the `helpHub` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct HelpHubPayload {
    /// Command bar settings.
    pub command_bar: Option<CommandBar>,
    /// `"true"` / `"false"` as sent by the server.
    pub enabled: Option<Value>,
}

/// AI feature state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ai {
    /// Copilot state.
    pub copilot: Copilot,
}

/// Copilot feature state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Copilot {
    /// Whether the copilot is available.
    pub enabled: bool,
}

/// Analytics feature state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Analytics {
    /// Whether analytics are collected.
    pub enabled: bool,
    /// PostHog connection settings.
    pub post_hog: PostHog,
}

/// PostHog connection settings, passed through unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PostHog {
    /// Project API key.
    pub api_key: Option<String>,
    /// Ingestion host.
    pub host: Option<String>,
}

/// Application metadata.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Application {
    /// Reported product tier.
    pub edition: Edition,
}

/// Help hub state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HelpHub {
    /// Command bar settings.
    pub command_bar: CommandBar,
    /// Whether the help hub is shown.
    pub enabled: bool,
}

impl Default for HelpHub {
    fn default() -> Self {
        Self {
            command_bar: CommandBar::default(),
            enabled: true,
        }
    }
}

/// Command bar settings, passed through unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct CommandBar {
    /// Organisation identifier.
    pub org_id: Option<String>,
}

/// Self-service registration settings, passed through unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct SignUp {
    /// Whether new accounts need activation.
    pub activation_required: bool,
    /// Whether sign-up is offered.
    pub enabled: bool,
}

/// Template submission links, passed through unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TemplatesSubmissionForm {
    /// Project template form URL.
    pub projects: Option<String>,
    /// Workflow template form URL.
    pub workflows: Option<String>,
}
