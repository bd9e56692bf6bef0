//! Read-only decorator used by status mode: every write becomes a no-op.

use crate::error::SourceError;
use crate::source::{SourceSettings, TrackerSource};
use crate::types::{Issue, IssueFields};

/// Wraps a source so that add, update and close return without touching the
/// backend. Reads and lifecycle calls pass straight through.
pub struct ReadOnlySource {
    inner: Box<dyn TrackerSource>,
}

impl ReadOnlySource {
    pub fn new(inner: Box<dyn TrackerSource>) -> Self {
        Self { inner }
    }
}

impl TrackerSource for ReadOnlySource {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn settings(&self) -> &SourceSettings {
        self.inner.settings()
    }

    fn connect(&mut self) -> Result<(), SourceError> {
        self.inner.connect()
    }

    fn disconnect(&mut self) -> Result<(), SourceError> {
        self.inner.disconnect()
    }

    fn list_issues(&mut self) -> Result<Vec<Issue>, SourceError> {
        self.inner.list_issues()
    }

    fn get_issue(&mut self, id: &str) -> Result<Option<Issue>, SourceError> {
        self.inner.get_issue(id)
    }

    fn add_issue(&mut self, _issue: &mut Issue) -> Result<(), SourceError> {
        Ok(())
    }

    fn update_issue(&mut self, _issue: &Issue, _fields: IssueFields) -> Result<(), SourceError> {
        Ok(())
    }

    fn close_issue(&mut self, _issue: &Issue) -> Result<(), SourceError> {
        Ok(())
    }
}
