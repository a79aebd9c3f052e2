//! Logfolio - command line client for a personal media log
//!
//! Main entry point for the Logfolio CLI.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{categories, items, search, wall};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Logfolio - browse and manage your media log from the terminal
#[derive(Parser)]
#[command(name = "logfolio")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Server URL (default: from config, then http://127.0.0.1:8000)
    #[arg(long, global = true, env = "LOGFOLIO_SERVER_URL")]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Category management
    Categories(categories::CategoriesArgs),

    /// Log entries, statistics and todos
    Items(items::ItemsArgs),

    /// Search covers by title
    Search(search::SearchArgs),

    /// Show or export the achievement wall
    Wall(wall::WallArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing: console (human-readable) + rotating JSON file
    let filter = if cli.verbose {
        "logfolio=debug,logfolio_client=debug,logfolio_capture=debug,logfolio_config=debug,info"
    } else {
        "logfolio=info,logfolio_client=info,logfolio_capture=info,warn"
    };

    let log_dir = logfolio_config::user_config_dir()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "logfolio.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "logfolio=trace,logfolio_client=trace,logfolio_capture=trace,logfolio_config=trace,info",
                )),
        )
        .init();

    let loaded = logfolio_config::load_config(None)?;
    if cli.verbose {
        for path in loaded.loaded_from() {
            tracing::debug!(path = %path.display(), "loaded config");
        }
    }

    let ctx = commands::Context::new(&loaded.config, cli.server, cli.json, cli.verbose)?;

    // Dispatch to command handlers
    match cli.command {
        Commands::Categories(args) => categories::run(args, &ctx).await,
        Commands::Items(args) => items::run(args, &ctx).await,
        Commands::Search(args) => search::run(args, &ctx).await,
        Commands::Wall(args) => wall::run(args, &ctx).await,
    }
}
