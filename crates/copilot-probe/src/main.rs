//! copilot-probe - ask a Copilot Studio agent a question
//!
//! Main entry point for the probe CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{ask, config};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Ask a Copilot Studio agent a question and check the answer
#[derive(Parser)]
#[command(name = "copilot-probe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Directory to search for the azd settings store (default: current directory)
    #[arg(long, global = true, env = "COPILOT_PROBE_DIR")]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a conversation and ask one question
    Ask(ask::AskArgs),

    /// Show resolved connection settings and where they came from
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "copilot_probe=debug,copilot_client=debug,copilot_auth=debug,copilot_config=debug,info"
    } else {
        "copilot_probe=info,copilot_client=warn,copilot_auth=warn,copilot_config=warn,warn"
    };

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(
                    tracing_subscriber::EnvFilter::try_from_env("COPILOT_PROBE_LOG")
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
                ),
        )
        .init();

    // A local .env seeds the process environment; real variables win.
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Failed to load .env"),
    }

    let ctx = commands::Context {
        start_dir: cli.dir,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Ask(args) => ask::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}
