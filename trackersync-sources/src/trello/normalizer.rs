//! Mapping between Trello cards and normalized issues.
//!
//! Trello cannot store a foreign identifier, so the primary tracker's id is
//! encoded in the card title: a card named `S42: Fix crash` is the issue
//! `42` with description `Fix crash`. Cards without the prefix have an empty
//! id. Normalized issues keep the raw card in [`Issue::original`] so writes
//! can address the card by its own id.

use std::sync::OnceLock;

use regex::Regex;
use trackersync_core::{Issue, IssueField, IssueFields, SourceError, SourceSettings, TrackerSource};

static ID_PREFIX: OnceLock<Regex> = OnceLock::new();

fn id_prefix() -> &'static Regex {
    ID_PREFIX.get_or_init(|| Regex::new(r"\AS(\d+):\s*").expect("Invalid id prefix pattern"))
}

pub struct TrelloNormalizer {
    inner: Box<dyn TrackerSource>,
}

impl TrelloNormalizer {
    pub fn new(inner: Box<dyn TrackerSource>) -> Self {
        Self { inner }
    }
}

/// Card → issue: split the id prefix off the title.
fn normalize(card: Issue) -> Issue {
    let mut issue = card.clone();
    match id_prefix().captures(&card.description) {
        Some(caps) => {
            let prefix_len = caps.get(0).map_or(0, |m| m.end());
            issue.id = caps.get(1).map_or("", |m| m.as_str()).to_string();
            issue.description = card.description[prefix_len..].to_string();
        }
        None => issue.id.clear(),
    }
    issue.original = Some(Box::new(card));
    issue
}

/// Issue → card: prefix the title with the id and address the card that the
/// issue was read from, if any.
fn denormalize(issue: &Issue) -> Issue {
    let mut card = issue.clone();
    if issue.has_id() {
        card.description = format!("S{}: {}", issue.id, issue.description);
    }
    if let Some(original) = &issue.original {
        card.id = original.id.clone();
    }
    card
}

/// The id lives in the card title.
fn denormalize_fields(fields: IssueFields) -> IssueFields {
    if fields.contains(IssueField::Id) {
        fields
            .without(IssueField::Id)
            .with(IssueField::Description)
    } else {
        fields
    }
}

impl TrackerSource for TrelloNormalizer {
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
        Ok(self.inner.list_issues()?.into_iter().map(normalize).collect())
    }

    /// Always `None`: the board listing already contains every card the
    /// board knows about, closed ones included.
    fn get_issue(&mut self, _id: &str) -> Result<Option<Issue>, SourceError> {
        Ok(None)
    }

    /// The issue keeps its normalized id; the created card becomes its
    /// `original` so a later update in the same run reaches it.
    fn add_issue(&mut self, issue: &mut Issue) -> Result<(), SourceError> {
        let mut card = denormalize(issue);
        card.id.clear();
        self.inner.add_issue(&mut card)?;
        issue.original = Some(Box::new(card));
        Ok(())
    }

    fn update_issue(&mut self, issue: &Issue, fields: IssueFields) -> Result<(), SourceError> {
        self.inner
            .update_issue(&denormalize(issue), denormalize_fields(fields))
    }

    fn close_issue(&mut self, issue: &Issue) -> Result<(), SourceError> {
        self.inner.close_issue(&denormalize(issue))
    }
}
