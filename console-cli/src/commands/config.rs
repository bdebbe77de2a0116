use std::fs;

use anyhow::{Result, bail};
use shared::config::ClientConfig;

/// Generates a configuration file with the default settings in the current directory.
///
/// # Errors
/// Returns an error if the format is unsupported or if writing the file fails.
pub fn generate_config(format: &str) -> Result<()> {
    let (file_name, serialized) = render_config(format)?;
    fs::write(file_name, serialized.as_bytes())?;

    println!("Configuration file '{file_name}' generated successfully.");
    Ok(())
}

fn render_config(format: &str) -> Result<(&'static str, String)> {
    let config = ClientConfig::with_defaults();
    match format {
        "yaml" => Ok(("console.yaml", serde_yml::to_string(&config)?)),
        "json" => Ok(("console.json", serde_json::to_string_pretty(&config)?)),
        "toml" => Ok(("console.toml", toml::to_string_pretty(&config)?)),
        other => bail!("unsupported format {other:?}; use yaml, json, or toml"),
    }
}
