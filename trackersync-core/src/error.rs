//! Error types for trackersync-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::IssueField;

/// Errors raised by a tracker source or one of its decorators.
///
/// `source` fields carry the source's display name so that a failure deep in
/// a run still says which backend produced it.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The backend answered with a non-success HTTP status.
    #[error("failure received from {host} web service ({source_name}): {path} returned status {status}")]
    Http {
        source_name: String,
        host: String,
        path: String,
        status: u16,
    },

    /// The request never produced an HTTP response (DNS, TLS, timeout, ...).
    #[error("failure received while attempting to connect to {host} ({source_name}): {message}")]
    Transport {
        source_name: String,
        host: String,
        message: String,
    },

    /// The backend answered but the payload could not be understood.
    #[error("unexpected response from {source_name}: {message}")]
    Decode { source_name: String, message: String },

    /// An update asked for a field this backend cannot change.
    #[error("update of {field} field is not supported by {source_name}")]
    UnsupportedField {
        source_name: String,
        field: IssueField,
    },

    /// The source configuration is unusable.
    #[error("invalid {source_name} configuration: {message}")]
    Config { source_name: String, message: String },

    /// Writing to the traffic log sink failed.
    #[error("failed to write source traffic log: {0}")]
    Log(#[from] std::io::Error),
}

impl SourceError {
    pub fn config(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        SourceError::Config {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn decode(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        SourceError::Decode {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn unsupported(source_name: impl Into<String>, field: IssueField) -> Self {
        SourceError::UnsupportedField {
            source_name: source_name.into(),
            field,
        }
    }
}

/// Errors that can arise while loading or writing sync settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Underlying I/O failure (permission denied, disk full, ...).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load, with the file path for context.
    #[error("failed to parse settings at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A tracker entry could not be turned into its kind-specific settings.
    #[error("invalid '{kind}' tracker settings: {source}")]
    Tracker {
        kind: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// A tracker entry parsed but holds an unusable value.
    #[error("invalid '{kind}' tracker settings: {message}")]
    Invalid { kind: String, message: String },

    /// The settings file did not exist.
    #[error("settings file not found at {path}")]
    NotFound { path: PathBuf },

    /// Refused to overwrite an existing file with a template.
    #[error("{path} is an existing file; specify a file that doesn't exist")]
    AlreadyExists { path: PathBuf },

    /// A run always synchronizes exactly two trackers.
    #[error("exactly two trackers must be configured, found {0}")]
    TrackerCount(usize),

    /// No constructor is registered for the tracker `type`.
    #[error("unknown tracker type '{kind}' (known: {known})")]
    UnknownKind { kind: String, known: String },

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or pass --config")]
    HomeNotFound,
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SettingsError {
    SettingsError::Io {
        path: path.into(),
        source,
    }
}
