//! Error types for trackersync-engine.

use thiserror::Error;

use trackersync_core::{SettingsError, SourceError};

/// All errors that can arise from a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Exactly one of the two sources must be primary.
    #[error("exactly one tracker must be primary, found {primaries}")]
    PrimaryRole { primaries: usize },

    /// A source call failed; the run stops at the first failure.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Sources could not be built from the settings.
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
}
