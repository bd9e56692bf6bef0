//! Domain types shared by every tracker source and by the reconciliation engine.
//!
//! An [`Issue`] is a normalized snapshot of one tracked item. Its
//! `description` is the join key between the two configured sources for the
//! lifetime of one reconciliation pass.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Issue state
// ---------------------------------------------------------------------------

/// Whether an issue is still being worked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    #[default]
    Open,
    Closed,
}

impl IssueState {
    /// One-letter marker used by the plain-text issue dump.
    pub fn marker(self) -> char {
        match self {
            IssueState::Open => 'O',
            IssueState::Closed => 'C',
        }
    }
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueState::Open => write!(f, "open"),
            IssueState::Closed => write!(f, "closed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Field identifiers
// ---------------------------------------------------------------------------

/// A single field of an [`Issue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueField {
    Id,
    Description,
    Details,
    State,
}

impl IssueField {
    /// All fields, in mask bit order.
    pub const ALL: [IssueField; 4] = [
        IssueField::Id,
        IssueField::Description,
        IssueField::Details,
        IssueField::State,
    ];

    const fn bit(self) -> u8 {
        match self {
            IssueField::Id => 0x01,
            IssueField::Description => 0x02,
            IssueField::Details => 0x04,
            IssueField::State => 0x08,
        }
    }
}

impl fmt::Display for IssueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueField::Id => write!(f, "ID"),
            IssueField::Description => write!(f, "Description"),
            IssueField::Details => write!(f, "Details"),
            IssueField::State => write!(f, "State"),
        }
    }
}

/// Set of issue fields an update is allowed to touch.
///
/// Only update actions and update requests carry a field set; there is no
/// "overwrite the whole issue" operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IssueFields(u8);

impl IssueFields {
    pub const NONE: IssueFields = IssueFields(0);
    pub const ID: IssueFields = IssueFields(IssueField::Id.bit());
    pub const DESCRIPTION: IssueFields = IssueFields(IssueField::Description.bit());
    pub const DETAILS: IssueFields = IssueFields(IssueField::Details.bit());
    pub const STATE: IssueFields = IssueFields(IssueField::State.bit());

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, field: IssueField) -> bool {
        self.0 & field.bit() != 0
    }

    /// Copy of `self` with `field` added.
    pub fn with(self, field: IssueField) -> Self {
        Self(self.0 | field.bit())
    }

    /// Copy of `self` with `field` removed.
    pub fn without(self, field: IssueField) -> Self {
        Self(self.0 & !field.bit())
    }

    /// Individual fields in the set, in [`IssueField::ALL`] order.
    pub fn iter(self) -> impl Iterator<Item = IssueField> {
        IssueField::ALL.into_iter().filter(move |f| self.contains(*f))
    }
}

impl From<IssueField> for IssueFields {
    fn from(field: IssueField) -> Self {
        Self(field.bit())
    }
}

impl BitOr for IssueFields {
    type Output = IssueFields;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for IssueFields {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for IssueFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        let names: Vec<String> = self.iter().map(|field| field.to_string()).collect();
        write!(f, "{}", names.join(" | "))
    }
}

// ---------------------------------------------------------------------------
// Issue
// ---------------------------------------------------------------------------

/// Normalized representation of one tracked item.
#[derive(Debug, Default, Serialize)]
pub struct Issue {
    /// Backend identifier. Empty until the primary source assigns one.
    pub id: String,
    /// Short title; doubles as the cross-source join key.
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub state: IssueState,
    /// The issue as it looked before a normalizing decorator rewrote it.
    #[serde(skip)]
    pub original: Option<Box<Issue>>,
}

impl Issue {
    pub fn new(id: impl Into<String>, description: impl Into<String>, state: IssueState) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            details: None,
            state,
            original: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn is_open(&self) -> bool {
        self.state == IssueState::Open
    }

    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }

    /// `details` or the empty string.
    pub fn details_text(&self) -> &str {
        self.details.as_deref().unwrap_or("")
    }
}

/// Clones the field values only; the back-reference to the pre-normalization
/// issue is never carried over.
impl Clone for Issue {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            description: self.description.clone(),
            details: self.details.clone(),
            state: self.state,
            original: None,
        }
    }
}

impl PartialEq for Issue {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.description == other.description
            && self.details == other.details
            && self.state == other.state
    }
}

impl Eq for Issue {}

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// Role of a configured source for the whole run.
///
/// The primary source is the system of record for identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Primary,
    Secondary,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Primary => Side::Secondary,
            Side::Secondary => Side::Primary,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Primary => write!(f, "primary"),
            Side::Secondary => write!(f, "secondary"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
