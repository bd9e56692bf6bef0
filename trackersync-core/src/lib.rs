//! trackersync core library: the issue model, the tracker source contract,
//! source decorators, settings and the source factory.
//!
//! - [`types`]: [`Issue`], field sets and sides
//! - [`source`]: the [`TrackerSource`] trait
//! - [`read_only`], [`logging`]: decorators
//! - [`settings`]: YAML config load / template
//! - [`atomic`]: tmp-and-rename file writes
//! - [`factory`]: kind registry and decorator stacking
//! - `memory`: in-memory source for tests (`test-util` feature)

pub mod atomic;
pub mod error;
pub mod factory;
pub mod logging;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod read_only;
pub mod settings;
pub mod source;
pub mod types;

pub use error::{SettingsError, SourceError};
pub use factory::{SourceFactory, SourceRegistry};
pub use settings::{LogLevel, SyncSettings, TrackerConfig};
pub use source::{SourceSettings, TrackerSource};
pub use types::{Issue, IssueField, IssueFields, IssueState, Side};
