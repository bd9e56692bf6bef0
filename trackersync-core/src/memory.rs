//! In-memory tracker source.
//!
//! Keeps its issues in a shared store and journals every call, so a test can
//! hand the source to the engine as a `Box<dyn TrackerSource>` and still
//! inspect what happened through a [`Journal`] handle afterwards.

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

use crate::error::SourceError;
use crate::source::{SourceSettings, TrackerSource};
use crate::types::{Issue, IssueField, IssueFields, IssueState};

/// One recorded call. Write calls capture the identifier the caller passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect,
    Disconnect,
    List,
    Get(String),
    /// Description of the issue being added.
    Add(String),
    Update(String, IssueFields),
    Close(String),
}

/// Call kinds a [`MemorySource`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    Connect,
    Disconnect,
    List,
    Get,
    Add,
    Update,
    Close,
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    issues: Vec<Issue>,
}

/// Read handle onto a [`MemorySource`]'s store and call journal.
#[derive(Clone)]
pub struct Journal(Rc<RefCell<State>>);

impl Journal {
    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().calls.clone()
    }

    /// Only the write calls (add, update, close), in order.
    pub fn writes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Add(_) | Call::Update(..) | Call::Close(_)))
            .collect()
    }

    /// Current contents of the store, open and closed.
    pub fn issues(&self) -> Vec<Issue> {
        self.0.borrow().issues.clone()
    }
}

pub struct MemorySource {
    name: String,
    settings: SourceSettings,
    state: Rc<RefCell<State>>,
    next_ids: VecDeque<String>,
    id_counter: u32,
    failing: HashSet<CallKind>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, is_primary: bool) -> Self {
        Self {
            name: name.into(),
            settings: SourceSettings {
                is_primary,
                list_includes_closed: false,
            },
            state: Rc::default(),
            next_ids: VecDeque::new(),
            id_counter: 0,
            failing: HashSet::new(),
        }
    }

    pub fn list_includes_closed(mut self, yes: bool) -> Self {
        self.settings.list_includes_closed = yes;
        self
    }

    /// Seed the store. Closed issues are still reachable through `get_issue`
    /// when they are excluded from listings.
    pub fn with_issue(self, issue: Issue) -> Self {
        self.state.borrow_mut().issues.push(issue);
        self
    }

    /// Identifiers handed out by `add_issue`, in order. Once exhausted, ids
    /// continue as `<name>-1`, `<name>-2`, ...
    pub fn with_next_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.next_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn fail_on(mut self, kind: CallKind) -> Self {
        self.failing.insert(kind);
        self
    }

    pub fn journal(&self) -> Journal {
        Journal(Rc::clone(&self.state))
    }

    fn enter(&mut self, call: Call, kind: CallKind) -> Result<(), SourceError> {
        self.state.borrow_mut().calls.push(call);
        if self.failing.contains(&kind) {
            return Err(SourceError::Transport {
                source_name: self.name.clone(),
                host: "memory".to_string(),
                message: format!("{kind:?} failed"),
            });
        }
        Ok(())
    }

    fn next_id(&mut self) -> String {
        self.next_ids.pop_front().unwrap_or_else(|| {
            self.id_counter += 1;
            format!("{}-{}", self.name, self.id_counter)
        })
    }
}

impl TrackerSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn settings(&self) -> &SourceSettings {
        &self.settings
    }

    fn connect(&mut self) -> Result<(), SourceError> {
        self.enter(Call::Connect, CallKind::Connect)
    }

    fn disconnect(&mut self) -> Result<(), SourceError> {
        self.enter(Call::Disconnect, CallKind::Disconnect)
    }

    fn list_issues(&mut self) -> Result<Vec<Issue>, SourceError> {
        self.enter(Call::List, CallKind::List)?;
        let include_closed = self.settings.list_includes_closed;
        Ok(self
            .state
            .borrow()
            .issues
            .iter()
            .filter(|i| include_closed || i.is_open())
            .cloned()
            .collect())
    }

    fn get_issue(&mut self, id: &str) -> Result<Option<Issue>, SourceError> {
        self.enter(Call::Get(id.to_string()), CallKind::Get)?;
        Ok(self.state.borrow().issues.iter().find(|i| i.id == id).cloned())
    }

    /// A primary source always assigns a fresh id. A secondary one keeps the
    /// id it is given and only assigns one when it is empty.
    fn add_issue(&mut self, issue: &mut Issue) -> Result<(), SourceError> {
        self.enter(Call::Add(issue.description.clone()), CallKind::Add)?;
        if self.settings.is_primary || !issue.has_id() {
            issue.id = self.next_id();
        }
        self.state.borrow_mut().issues.push(issue.clone());
        Ok(())
    }

    /// Locates the stored issue by description, since an `ID` update targets
    /// an issue whose stored id is still empty.
    fn update_issue(&mut self, issue: &Issue, fields: IssueFields) -> Result<(), SourceError> {
        self.enter(Call::Update(issue.id.clone(), fields), CallKind::Update)?;
        let mut state = self.state.borrow_mut();
        if let Some(stored) = state
            .issues
            .iter_mut()
            .find(|i| i.description == issue.description)
        {
            for field in fields.iter() {
                match field {
                    IssueField::Id => stored.id = issue.id.clone(),
                    IssueField::Description => stored.description = issue.description.clone(),
                    IssueField::Details => stored.details = issue.details.clone(),
                    IssueField::State => stored.state = issue.state,
                }
            }
        }
        Ok(())
    }

    fn close_issue(&mut self, issue: &Issue) -> Result<(), SourceError> {
        self.enter(Call::Close(issue.id.clone()), CallKind::Close)?;
        let mut state = self.state.borrow_mut();
        if let Some(stored) = state.issues.iter_mut().find(|i| i.id == issue.id) {
            stored.state = IssueState::Closed;
        }
        Ok(())
    }
}
