//! `trackersync init [<file>]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use trackersync_core::settings;

/// Write a commented settings template.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Where to write the template. Defaults to ~/.trackersync/config.yaml.
    pub path: Option<PathBuf>,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let path = match self.path {
            Some(path) => path,
            None => settings::default_path()?,
        };
        settings::write_template_at(&path)
            .with_context(|| format!("failed to write settings template to '{}'", path.display()))?;

        println!("✓ Wrote settings template to {}", path.display());
        println!("  Fill in both trackers, then preview with `trackersync sync --status`.");
        Ok(())
    }
}
