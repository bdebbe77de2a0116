//! `console info`: fetch and print the application info snapshot.

use std::{path::Path, sync::Arc};

use anyhow::{Result, bail};
use reqwest::cookie::Jar;
use shared::config::ClientConfig;
use stores::ApplicationInfoState;
use tracing::debug;
use url::Url;

use super::session;

/// Fetches the application info, sending the stored session cookies when present.
pub async fn show(config: &ClientConfig, jar_path: &Path, json: bool) -> Result<()> {
    let origin = config.origin()?;
    let jar = session_jar(&origin, jar_path)?;
    let context = session::connect(config, jar)?;
    let store = context.application_info();

    store.get_application_info().await?;
    let state = store.get_state();
    if state.loading {
        bail!("application info is unavailable; the server did not answer with 200 OK");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        println!("{}", format_info(&state));
    }
    Ok(())
}

/// The stored session when there is one, an empty jar otherwise. A session file that
/// exists but cannot be read is an error.
fn session_jar(origin: &Url, jar_path: &Path) -> Result<Arc<Jar>> {
    if jar_path.exists() {
        return session::load_cookie_jar(origin, jar_path);
    }
    debug!(path = %jar_path.display(), "no stored session; fetching anonymously");
    Ok(Arc::new(Jar::default()))
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

fn format_info(state: &ApplicationInfoState) -> String {
    let edition = state
        .edition()
        .map_or_else(|| "unreported".to_string(), |edition| edition.to_string());
    let mut lines = vec![
        format!("edition: {edition}"),
        format!("copilot: {}", on_off(state.ai.copilot.enabled)),
        format!("analytics: {}", on_off(state.analytics.enabled)),
        format!("help hub: {}", on_off(state.help_hub.enabled)),
        format!(
            "sign-up: {} (activation {})",
            on_off(state.sign_up.enabled),
            if state.sign_up.activation_required {
                "required"
            } else {
                "not required"
            }
        ),
    ];

    if !state.feature_flags.is_empty() {
        lines.push("feature flags:".to_string());
        lines.extend(
            state
                .feature_flags
                .iter()
                .map(|(name, enabled)| format!("  {name}: {}", on_off(*enabled))),
        );
    }
    lines.join("\n")
}
