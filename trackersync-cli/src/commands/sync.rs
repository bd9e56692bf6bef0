//! `trackersync sync`: one reconciliation pass between the configured trackers.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use trackersync_core::{LogLevel, SourceFactory};
use trackersync_engine::{ActionPlan, SyncEngine, SyncOp};
use trackersync_sources::builtin_registry;

/// Arguments for `trackersync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Settings file. Defaults to ~/.trackersync/config.yaml.
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Show the actions a sync would take without changing either tracker.
    #[arg(long, short = 's')]
    pub status: bool,

    /// Log every read and write exchanged with the trackers.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let mut settings = super::load_settings(self.config.as_deref())?;
        if self.status {
            settings.apply_status_mode();
        }
        if self.verbose {
            settings.log_level = LogLevel::Verbose;
        }

        let registry = builtin_registry();
        let factory = SourceFactory::from_settings(&registry, &settings);
        let mut engine =
            SyncEngine::from_settings(&settings, &factory).context("failed to set up trackers")?;
        engine
            .run()
            .with_context(|| format!("sync stopped in state '{}'", engine.state()))?;

        print_summary(engine.plan(), settings.no_updates);
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Counts {
    added: usize,
    updated: usize,
    closed: usize,
}

fn count(plan: &ActionPlan) -> Counts {
    let mut counts = Counts::default();
    for action in &plan.actions {
        match action.op {
            SyncOp::Add => counts.added += 1,
            SyncOp::Update(_) => counts.updated += 1,
            SyncOp::Close => counts.closed += 1,
        }
    }
    counts
}

fn print_summary(plan: Option<&ActionPlan>, read_only: bool) {
    let prefix = if read_only { "[status] " } else { "" };
    let Some(plan) = plan.filter(|p| !p.is_empty()) else {
        println!("{prefix}✓ trackers are in sync, nothing to do");
        return;
    };

    let counts = count(plan);
    let verb = if read_only { "would run" } else { "applied" };
    println!(
        "{prefix}✓ {} actions {verb} ({} added, {} updated, {} closed)",
        plan.len(),
        counts.added,
        counts.updated,
        counts.closed
    );
    if read_only {
        println!("  No tracker was changed. Run without --status to apply.");
    }
}
