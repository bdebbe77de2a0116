//! Tracing setup for the command-line client.
//!
//! Log lines go to stderr so command output on stdout stays pipeable.

use std::io;

use shared::config::{ClientConfig, LogFormat};
use tracing::Subscriber;
use tracing_subscriber::{
    EnvFilter,
    filter::LevelFilter,
    fmt::{self, MakeWriter},
};

/// Installs the global subscriber and returns the configured level.
///
/// `RUST_LOG` wins over `logging.level` when it is set.
pub fn initialize_tracing(config: &ClientConfig) -> String {
    let subscriber = subscriber_with_writer(config, io::stderr);
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("global tracing subscriber already installed");
    }

    config.logging.level.clone()
}

fn build_env_filter(config: &ClientConfig) -> EnvFilter {
    let default_level = config
        .logging
        .level
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::INFO);

    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy()
    })
}

fn subscriber_with_writer<W>(config: &ClientConfig, writer: W) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let builder = fmt::fmt()
        .with_env_filter(build_env_filter(config))
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(writer);

    if matches!(config.logging.format, LogFormat::Json) {
        Box::new(builder.json().with_ansi(false).finish())
    } else {
        Box::new(builder.with_ansi(false).finish())
    }
}
