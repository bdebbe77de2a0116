//! Wire and state models shared between the stores and their consumers.

pub mod account;
pub mod application_info;

pub use account::Account;
pub use application_info::{
    Ai, AiPayload, Analytics, AnalyticsPayload, Application, ApplicationInfoPayload,
    ApplicationPayload, CommandBar, Copilot, Edition, FlagPayload, HelpHub, HelpHubPayload,
    PostHog, SignUp, TemplatesSubmissionForm, parse_flag,
};
