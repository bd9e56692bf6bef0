//! trackersync: keep two issue trackers in step.
//!
//! # Usage
//!
//! ```text
//! trackersync sync [--config <file>] [--status] [--verbose]
//! trackersync init [<file>]
//! trackersync issues [--config <file>] [--tracker 1|2] [--json | --output <file>]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{init::InitArgs, issues::IssuesArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "trackersync",
    version,
    about = "Synchronize issues between two issue trackers",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one reconciliation pass between the two configured trackers.
    Sync(SyncArgs),

    /// Write a commented settings template.
    Init(InitArgs),

    /// List the normalized issues of one configured tracker.
    Issues(IssuesArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

/// Diagnostics go to stderr, filtered by `RUST_LOG` (default `warn`), so they
/// never mix with the traffic log on stdout.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Sync(args) => args.run(),
        Commands::Init(args) => args.run(),
        Commands::Issues(args) => args.run(),
    }
}
