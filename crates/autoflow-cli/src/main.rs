//! CLI entry point for Autoflow.
//!
//! The `autoflow` binary serves the HTTP API, runs workflow files, executes
//! single actions and lists the action catalog.

mod commands;
mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// Autoflow: run automation workflows against third-party APIs.
#[derive(Parser)]
#[command(name = "autoflow", version, about = "Autoflow workflow execution engine")]
struct Cli {
    /// Path to the TOML config file (default: config/autoflow.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server.
    Serve {
        #[arg(long)]
        bind: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run a workflow graph from a JSON file.
    Run {
        /// Workflow file: a graph, or `{ "workflow": graph }`.
        workflow: PathBuf,
        /// JSON object of credential overrides.
        #[arg(long)]
        credentials: Option<PathBuf>,
        /// Run as this user (enables connected-account credentials).
        #[arg(long)]
        user: Option<String>,
        /// Skip remaining nodes after the first failure.
        #[arg(long)]
        stop_on_failure: bool,
        /// Order nodes by `data.sequence` instead of layout position.
        #[arg(long)]
        by_sequence: bool,
    },

    /// Execute a single action.
    Exec {
        action_id: String,
        /// Action config as a JSON object.
        #[arg(long, default_value = "{}")]
        config: String,
        #[arg(long)]
        user: Option<String>,
    },

    /// List available actions.
    Actions {
        #[arg(long)]
        platform: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;
    init_tracing(&config.log.level, cli.json);

    match cli.command {
        Commands::Serve { bind, port } => commands::serve(config, bind, port).await,
        Commands::Run {
            workflow,
            credentials,
            user,
            stop_on_failure,
            by_sequence,
        } => {
            let options = commands::RunArgs {
                workflow,
                credentials,
                user,
                stop_on_failure,
                by_sequence,
            };
            commands::run(config, options).await
        }
        Commands::Exec {
            action_id,
            config: action_config,
            user,
        } => commands::exec(config, &action_id, &action_config, user.as_deref()).await,
        Commands::Actions { platform } => commands::actions(platform.as_deref()),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Initialize the tracing subscriber; `RUST_LOG` wins over `default_level`.
fn init_tracing(default_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}
