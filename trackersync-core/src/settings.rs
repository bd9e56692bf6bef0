//! YAML sync settings.
//!
//! # Storage layout
//!
//! ```text
//! ~/.trackersync/
//!   config.yaml     (mode 0600; holds API tokens)
//! ```
//!
//! Every function that touches the default location has two forms:
//! - `fn_at(home: &Path, …)`: explicit home, used by tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()` and delegates to `_at`

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::atomic;
use crate::error::{io_err, SettingsError};
use crate::source::SourceSettings;

/// Commented starter configuration written by `trackersync init`.
pub const TEMPLATE: &str = include_str!("templates/config.yaml");

// ---------------------------------------------------------------------------
// 1. Types
// ---------------------------------------------------------------------------

/// How much source traffic is echoed to the log sink.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    None,
    /// Record every add, update and close.
    Actions,
    /// Also record every issue read from either source.
    Verbose,
}

/// Top-level contents of `config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    #[serde(default)]
    pub log_level: LogLevel,
    /// Run against read-only sources: the plan is computed and logged but
    /// never written back.
    #[serde(default)]
    pub no_updates: bool,
    pub trackers: Vec<TrackerConfig>,
}

impl SyncSettings {
    /// Status mode: never write, and at least show the actions that would run.
    pub fn apply_status_mode(&mut self) {
        self.no_updates = true;
        self.log_level = self.log_level.max(LogLevel::Actions);
    }
}

/// One `trackers:` entry. Keys other than the common ones are kept in
/// `options` and interpreted by the source kind named in `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_includes_closed: Option<bool>,
    #[serde(flatten)]
    pub options: serde_yaml::Mapping,
}

impl TrackerConfig {
    /// Common settings, with unset keys taken from the kind's `defaults`.
    pub fn source_settings(&self, defaults: SourceSettings) -> SourceSettings {
        SourceSettings {
            is_primary: self.primary.unwrap_or(defaults.is_primary),
            list_includes_closed: self
                .list_includes_closed
                .unwrap_or(defaults.list_includes_closed),
        }
    }

    /// Deserialize the kind-specific keys into `T`.
    pub fn options<T: DeserializeOwned>(&self) -> Result<T, SettingsError> {
        serde_yaml::from_value(serde_yaml::Value::Mapping(self.options.clone())).map_err(|e| {
            SettingsError::Tracker {
                kind: self.kind.clone(),
                source: e,
            }
        })
    }

    pub fn invalid(&self, message: impl Into<String>) -> SettingsError {
        SettingsError::Invalid {
            kind: self.kind.clone(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// 2. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.trackersync/config.yaml`: pure, no I/O.
pub fn default_path_at(home: &Path) -> PathBuf {
    home.join(".trackersync").join("config.yaml")
}

/// `default_path_at` convenience wrapper.
pub fn default_path() -> Result<PathBuf, SettingsError> {
    Ok(default_path_at(&home()?))
}

// ---------------------------------------------------------------------------
// 3. Load
// ---------------------------------------------------------------------------

/// Load and validate settings from `path`.
///
/// Returns `SettingsError::NotFound` if absent, `SettingsError::Parse` (with
/// path + line context) if malformed, `SettingsError::TrackerCount` unless
/// exactly two trackers are configured.
pub fn load_at(path: &Path) -> Result<SyncSettings, SettingsError> {
    if !path.exists() {
        return Err(SettingsError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let settings: SyncSettings =
        serde_yaml::from_str(&contents).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
    if settings.trackers.len() != 2 {
        return Err(SettingsError::TrackerCount(settings.trackers.len()));
    }
    tracing::debug!(path = %path.display(), level = ?settings.log_level, "settings loaded");
    Ok(settings)
}

// ---------------------------------------------------------------------------
// 4. Template
// ---------------------------------------------------------------------------

/// Write [`TEMPLATE`] to `path`, which must not exist yet.
///
/// Written through [`atomic::write_private`], so a failed write never
/// creates the target.
pub fn write_template_at(path: &Path) -> Result<(), SettingsError> {
    if path.exists() {
        return Err(SettingsError::AlreadyExists {
            path: path.to_path_buf(),
        });
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    atomic::write_private(path, TEMPLATE).map_err(|e| io_err(path, e))
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, SettingsError> {
    dirs::home_dir().ok_or(SettingsError::HomeNotFound)
}


// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
