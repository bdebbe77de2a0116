//! Main entry point for the console command-line client.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use shared::config::ClientConfig;

mod commands;
mod logging;

/// Console CLI
#[derive(Parser)]
#[command(name = "console")]
#[command(about = "Command-line client for the console API", long_about = None)]
struct Cli {
    /// Path to the configuration file (yaml, json, or toml)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Console API origin; overrides the configuration file and environment
    #[arg(long, global = true)]
    server: Option<String>,

    /// Where session cookies are kept between invocations
    #[arg(long, global = true)]
    session: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Subcommands for the console CLI
#[derive(Subcommand)]
enum Commands {
    /// Show the deployment's edition, feature toggles, and integrations
    Info {
        /// Print the full snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sign in and store the session cookies
    Login {
        /// Account login or email
        #[arg(long, short)]
        username: String,

        /// Ask the server for a long-lived session
        #[arg(long)]
        remember_me: bool,
    },

    /// Show the account behind the stored session
    Me {
        /// Print the account as JSON
        #[arg(long)]
        json: bool,
    },

    /// End the session on the server and forget the stored cookies
    Logout,

    /// Generate shell completion scripts for the CLI
    Completion {
        /// Shell to generate the completion script for (bash, zsh, fish, powershell, elvish)
        #[arg(long, short)]
        shell: String,
    },

    /// Generate a configuration file with the default settings
    Config {
        /// Format of the configuration file to generate (yaml, json, or toml). Defaults to yaml.
        #[arg(long, short)]
        format: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    let command = match cli.command {
        Commands::Completion { shell } => {
            let shell = shell
                .parse::<clap_complete::Shell>()
                .map_err(|err| anyhow::anyhow!("invalid shell {shell:?}: {err}"))?;
            commands::completion::generate_completion(shell);
            return Ok(());
        }
        Commands::Config { format } => {
            let format = format.unwrap_or_else(|| "yaml".to_string());
            commands::config::generate_config(&format)?;
            return Ok(());
        }
        command => command,
    };

    let config = ClientConfig::load_config(cli.config, cli.server)
        .context("failed to load configuration")?;
    logging::initialize_tracing(&config);
    let session = cli.session.unwrap_or_else(commands::session::session_path);

    match command {
        Commands::Info { json } => commands::info::show(&config, &session, json).await?,
        Commands::Login {
            username,
            remember_me,
        } => commands::session::login(&config, &session, &username, remember_me).await?,
        Commands::Me { json } => commands::session::me(&config, &session, json).await?,
        Commands::Logout => commands::session::logout(&config, &session).await?,
        Commands::Completion { .. } | Commands::Config { .. } => {}
    }

    Ok(())
}
