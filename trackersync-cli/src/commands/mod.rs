pub mod init;
pub mod issues;
pub mod sync;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use trackersync_core::{settings, SyncSettings};

/// Load settings from `--config`, or from the default location.
pub(crate) fn load_settings(config: Option<&Path>) -> Result<SyncSettings> {
    let path: PathBuf = match config {
        Some(path) => path.to_path_buf(),
        None => settings::default_path()?,
    };
    settings::load_at(&path).with_context(|| {
        format!(
            "cannot load settings from '{}'; run `trackersync init` to create a template",
            path.display()
        )
    })
}
