//! `trackersync issues`: inspect what one tracker looks like after normalization.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use trackersync_core::{atomic, Issue, LogLevel, SourceFactory};
use trackersync_sources::builtin_registry;

const SEPARATOR: &str = "--------------------------------------------------------------------";

/// Arguments for `trackersync issues`.
#[derive(Args, Debug)]
pub struct IssuesArgs {
    /// Settings file. Defaults to ~/.trackersync/config.yaml.
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Position of the tracker in the settings file.
    #[arg(
        long,
        short = 't',
        default_value_t = 1,
        value_parser = clap::value_parser!(u8).range(1..=2)
    )]
    pub tracker: u8,

    /// Write a plain-text dump to FILE instead of printing a table.
    #[arg(long, short = 'o', value_name = "FILE", conflicts_with = "json")]
    pub output: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl IssuesArgs {
    pub fn run(self) -> Result<()> {
        let settings = super::load_settings(self.config.as_deref())?;
        let config = settings
            .trackers
            .get(usize::from(self.tracker) - 1)
            .with_context(|| format!("no tracker #{} configured", self.tracker))?;

        // Read-only and silent, whatever the settings file asks for.
        let registry = builtin_registry();
        let factory = SourceFactory::new(&registry, LogLevel::None, true);
        let mut source = factory
            .create(config)
            .with_context(|| format!("failed to set up '{}' tracker", config.kind))?;

        source
            .connect()
            .with_context(|| format!("failed to connect to {}", source.name()))?;
        let listed = source.list_issues();
        if let Err(err) = source.disconnect() {
            tracing::debug!(error = %err, "disconnect failed");
        }
        let issues =
            listed.with_context(|| format!("failed to list issues of {}", source.name()))?;

        if let Some(path) = &self.output {
            atomic::write_private(path, render_dump(&issues))
                .with_context(|| format!("failed to write issue dump to '{}'", path.display()))?;
            println!("✓ Wrote {} issues to {}", issues.len(), path.display());
        } else if self.json {
            let payload = IssuesJson {
                tracker: source.name(),
                issues: &issues,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize issues")?
            );
        } else {
            print_table(source.name(), issues);
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct IssuesJson<'a> {
    tracker: &'a str,
    issues: &'a [Issue],
}

// ---------------------------------------------------------------------------
// Plain-text dump
// ---------------------------------------------------------------------------

/// Per issue: a separator, `<id>[O|C]: <description>`, the details line and
/// a blank line.
fn render_dump(issues: &[Issue]) -> String {
    let mut out = String::new();
    for issue in issues {
        let _ = writeln!(out, "{SEPARATOR}");
        let _ = writeln!(
            out,
            "{}[{}]: {}",
            issue.id,
            issue.state.marker(),
            issue.description
        );
        let _ = writeln!(out, "{}", issue.details_text());
        let _ = writeln!(out);
    }
    out
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

#[derive(Tabled)]
struct IssueRow {
    #[tabled(rename = "id")]
    id: String,
    #[tabled(rename = "state")]
    state: String,
    #[tabled(rename = "description")]
    description: String,
}

fn print_table(source_name: &str, issues: Vec<Issue>) {
    let open = issues.iter().filter(|i| i.is_open()).count();
    println!(
        "{} | {} open | {} closed",
        source_name.bold(),
        open.to_string().green(),
        (issues.len() - open).to_string().bright_black(),
    );
    if issues.is_empty() {
        println!("No issues.");
        return;
    }

    let rows: Vec<IssueRow> = issues
        .into_iter()
        .map(|issue| IssueRow {
            id: if issue.has_id() {
                issue.id
            } else {
                "-".to_string()
            },
            state: issue.state.to_string(),
            description: issue.description,
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}
