//! Traffic-logging decorator.
//!
//! Each call through a [`LoggingSource`] produces one human-readable record
//! on the sink:
//!
//! ```text
//! GitHub--ADD
//!     : Fix crash
//!     stack trace attached
//! --------------------------------------------------------------
//!
//! ```
//!
//! Reads (`GET_LIST[n]`, `GET`) are recorded when input logging is on; writes
//! (`ADD`, `UPDATE( fields )`, `CLOSE`) when output logging is on. Write
//! records are emitted before the call is forwarded, so a failing write is
//! still visible in the log.

use std::io::Write;

use crate::error::SourceError;
use crate::source::{SourceSettings, TrackerSource};
use crate::types::{Issue, IssueFields};

const SEPARATOR: &str = "--------------------------------------------------------------";

/// Which directions of traffic a [`LoggingSource`] records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Record calls that read from the backend.
    pub log_input: bool,
    /// Record calls that write to the backend.
    pub log_output: bool,
}

pub struct LoggingSource {
    inner: Box<dyn TrackerSource>,
    sink: Box<dyn Write>,
    config: LoggingConfig,
}

impl LoggingSource {
    pub fn new(inner: Box<dyn TrackerSource>, sink: Box<dyn Write>, config: LoggingConfig) -> Self {
        Self {
            inner,
            sink,
            config,
        }
    }

    fn record(
        &mut self,
        action: &str,
        issue: Option<&Issue>,
        missing_id: Option<&str>,
    ) -> Result<(), SourceError> {
        writeln!(self.sink, "{}--{}", self.inner.name(), action)?;
        if let Some(issue) = issue {
            writeln!(self.sink, "    {}: {}", issue.id, issue.description)?;
            writeln!(self.sink, "    {}", issue.details_text())?;
        }
        if let Some(id) = missing_id {
            writeln!(self.sink, "    Issue[{id}] does not exist")?;
        }
        writeln!(self.sink, "{SEPARATOR}")?;
        writeln!(self.sink)?;
        self.sink.flush()?;
        Ok(())
    }
}

impl TrackerSource for LoggingSource {
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
        let issues = self.inner.list_issues()?;
        if self.config.log_input {
            for (n, issue) in issues.iter().enumerate() {
                self.record(&format!("GET_LIST[{n}]"), Some(issue), None)?;
            }
        }
        Ok(issues)
    }

    fn get_issue(&mut self, id: &str) -> Result<Option<Issue>, SourceError> {
        let issue = self.inner.get_issue(id)?;
        if self.config.log_input {
            match &issue {
                Some(found) => self.record("GET", Some(found), None)?,
                None => self.record("GET", None, Some(id))?,
            }
        }
        Ok(issue)
    }

    fn add_issue(&mut self, issue: &mut Issue) -> Result<(), SourceError> {
        if self.config.log_output {
            self.record("ADD", Some(issue), None)?;
        }
        self.inner.add_issue(issue)
    }

    fn update_issue(&mut self, issue: &Issue, fields: IssueFields) -> Result<(), SourceError> {
        if self.config.log_output {
            self.record(&format!("UPDATE( {fields} )"), Some(issue), None)?;
        }
        self.inner.update_issue(issue, fields)
    }

    fn close_issue(&mut self, issue: &Issue) -> Result<(), SourceError> {
        if self.config.log_output {
            self.record("CLOSE", Some(issue), None)?;
        }
        self.inner.close_issue(issue)
    }
}
