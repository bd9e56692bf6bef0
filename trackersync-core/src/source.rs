//! The tracker source capability contract.
//!
//! Concrete backends (GitHub, Trello) and cross-cutting decorators
//! ([`ReadOnlySource`](crate::read_only::ReadOnlySource),
//! [`LoggingSource`](crate::logging::LoggingSource)) all implement
//! [`TrackerSource`], so the engine never knows which one it is talking to.

use crate::error::SourceError;
use crate::types::{Issue, IssueFields};

/// Settings common to every source kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSettings {
    /// The primary source assigns identifiers; the secondary records them.
    pub is_primary: bool,
    /// `list_issues` also returns closed issues.
    pub list_includes_closed: bool,
}

/// One issue-tracking database.
///
/// Every call is a blocking round trip. Methods take `&mut self` because
/// `connect` may cache backend-internal identifiers used by later calls.
pub trait TrackerSource {
    /// Stable short label used in logs and error messages.
    fn name(&self) -> &str;

    fn settings(&self) -> &SourceSettings;

    /// Prepare the source for use. Safe to call more than once.
    fn connect(&mut self) -> Result<(), SourceError> {
        Ok(())
    }

    /// Best-effort teardown; callers may ignore the result.
    fn disconnect(&mut self) -> Result<(), SourceError> {
        Ok(())
    }

    /// All open issues, plus closed ones when
    /// [`SourceSettings::list_includes_closed`] is set.
    fn list_issues(&mut self) -> Result<Vec<Issue>, SourceError>;

    /// Fetch one issue by identifier. `Ok(None)` means "not found".
    fn get_issue(&mut self, id: &str) -> Result<Option<Issue>, SourceError>;

    /// Create `issue` and store the newly assigned identifier in `issue.id`.
    fn add_issue(&mut self, issue: &mut Issue) -> Result<(), SourceError>;

    /// Apply only the fields named in `fields`. A field the backend cannot
    /// change yields [`SourceError::UnsupportedField`].
    fn update_issue(&mut self, issue: &Issue, fields: IssueFields) -> Result<(), SourceError>;

    fn close_issue(&mut self, issue: &Issue) -> Result<(), SourceError>;
}
