//! Comparing two issue lists and deciding what must change.
//!
//! Issues are joined on their description. For every description present on
//! only one side the reconciler asks its [`ReconcileHandler`] to look the
//! issue up by id on the other side, since that side may exclude closed
//! issues from its listings.

use std::collections::HashMap;

use trackersync_core::{Issue, IssueState, Side};

/// What must happen to one issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionKind {
    /// Create the issue on the side that lacks it.
    Add,
    /// Close the issue on the side where it is still open.
    Close,
}

/// A single reconciliation outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub kind: DecisionKind,
    /// The side the decision applies to.
    pub side: Side,
    /// For `Add`, the issue as it exists on the other side. For `Close`, the
    /// issue as it exists on `side`.
    pub issue: Issue,
}

/// Collaborators the reconciler needs while it runs.
pub trait ReconcileHandler {
    type Error;

    /// Fetch the issue with `id` from `side`. `Ok(None)` means it does not
    /// exist there.
    fn lookup_issue(&mut self, id: &str, side: Side) -> Result<Option<Issue>, Self::Error>;

    fn report_decision(&mut self, decision: Decision) -> Result<(), Self::Error>;
}

/// Issues of one side keyed by description.
///
/// A repeated description replaces the earlier issue but keeps the earlier
/// position, so iteration follows input order.
struct Indexed {
    slots: Vec<Option<Issue>>,
    by_description: HashMap<String, usize>,
}

impl Indexed {
    fn new(issues: Vec<Issue>) -> Self {
        let mut slots: Vec<Option<Issue>> = Vec::with_capacity(issues.len());
        let mut by_description = HashMap::with_capacity(issues.len());
        for issue in issues {
            match by_description.get(&issue.description) {
                Some(&at) => slots[at] = Some(issue),
                None => {
                    by_description.insert(issue.description.clone(), slots.len());
                    slots.push(Some(issue));
                }
            }
        }
        Self {
            slots,
            by_description,
        }
    }

    /// Remove and return the issue with `description`, if still present.
    fn take(&mut self, description: &str) -> Option<Issue> {
        let at = *self.by_description.get(description)?;
        self.slots[at].take()
    }

    fn into_remaining(self) -> impl Iterator<Item = Issue> {
        self.slots.into_iter().flatten()
    }
}

/// Reconcile `primary` against `secondary`, reporting each decision to
/// `handler` as soon as it is made.
///
/// Matched pairs and primary-only issues are handled in primary input order,
/// then secondary-only issues in secondary input order. The first handler
/// error stops the pass and is returned unchanged.
pub fn reconcile<H: ReconcileHandler>(
    primary: Vec<Issue>,
    secondary: Vec<Issue>,
    handler: &mut H,
) -> Result<(), H::Error> {
    let primary = Indexed::new(primary);
    let mut secondary = Indexed::new(secondary);

    for issue in primary.into_remaining() {
        match secondary.take(&issue.description) {
            Some(matched) => {
                if issue.state != matched.state {
                    close_open_one(issue, matched, handler)?;
                }
            }
            None => one_sided(issue, Side::Primary, handler)?,
        }
    }

    for issue in secondary.into_remaining() {
        one_sided(issue, Side::Secondary, handler)?;
    }
    Ok(())
}

fn close_open_one<H: ReconcileHandler>(
    primary: Issue,
    secondary: Issue,
    handler: &mut H,
) -> Result<(), H::Error> {
    let (side, issue) = if primary.state == IssueState::Closed {
        (Side::Secondary, secondary)
    } else {
        (Side::Primary, primary)
    };
    tracing::debug!(%side, description = %issue.description, "state mismatch");
    handler.report_decision(Decision {
        kind: DecisionKind::Close,
        side,
        issue,
    })
}

fn one_sided<H: ReconcileHandler>(
    issue: Issue,
    existing: Side,
    handler: &mut H,
) -> Result<(), H::Error> {
    if issue.state == IssueState::Closed {
        return Ok(());
    }
    let missing = existing.other();

    // An issue without an id has never been synchronized: nothing to look up.
    let counterpart = if issue.has_id() {
        handler.lookup_issue(&issue.id, missing)?
    } else {
        None
    };

    let decision = match counterpart {
        None => Decision {
            kind: DecisionKind::Add,
            side: missing,
            issue,
        },
        Some(found) if found.state == IssueState::Closed => Decision {
            kind: DecisionKind::Close,
            side: existing,
            issue,
        },
        Some(_) => return Ok(()),
    };
    handler.report_decision(decision)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records decisions; lookups are answered from a fixed table.
    #[derive(Default)]
    struct Recorder {
        known: Vec<(Side, Issue)>,
        lookups: Vec<(String, Side)>,
        decisions: Vec<Decision>,
    }

    impl ReconcileHandler for Recorder {
        type Error = String;

        fn lookup_issue(&mut self, id: &str, side: Side) -> Result<Option<Issue>, String> {
            self.lookups.push((id.to_string(), side));
            Ok(self
                .known
                .iter()
                .find(|(s, i)| *s == side && i.id == id)
                .map(|(_, i)| i.clone()))
        }

        fn report_decision(&mut self, decision: Decision) -> Result<(), String> {
            self.decisions.push(decision);
            Ok(())
        }
    }

    fn open(id: &str, description: &str) -> Issue {
        Issue::new(id, description, IssueState::Open)
    }

    #[test]
    fn duplicate_description_keeps_last_issue_at_first_position() {
        let indexed = Indexed::new(vec![open("1", "a"), open("2", "b"), open("3", "a")]);
        let ids: Vec<String> = indexed.into_remaining().map(|i| i.id).collect();
        assert_eq!(ids, vec!["3", "2"]);
    }

    #[test]
    fn secondary_one_sided_come_after_primary() {
        let mut handler = Recorder::default();
        reconcile(
            vec![open("", "from primary")],
            vec![open("", "from secondary")],
            &mut handler,
        )
        .unwrap();

        let sides: Vec<Side> = handler.decisions.iter().map(|d| d.side).collect();
        assert_eq!(sides, vec![Side::Secondary, Side::Primary]);
        assert!(handler.lookups.is_empty());
    }

    #[test]
    fn matched_secondary_is_not_revisited() {
        let mut handler = Recorder::default();
        reconcile(vec![open("1", "a")], vec![open("1", "a")], &mut handler).unwrap();
        assert!(handler.decisions.is_empty());
        assert!(handler.lookups.is_empty());
    }

    #[test]
    fn lookup_error_stops_the_pass() {
        struct Failing(usize);
        impl ReconcileHandler for Failing {
            type Error = &'static str;
            fn lookup_issue(&mut self, _: &str, _: Side) -> Result<Option<Issue>, Self::Error> {
                Err("offline")
            }
            fn report_decision(&mut self, _: Decision) -> Result<(), Self::Error> {
                self.0 += 1;
                Ok(())
            }
        }

        let mut handler = Failing(0);
        let err = reconcile(
            vec![open("1", "a"), open("", "b")],
            vec![],
            &mut handler,
        )
        .unwrap_err();
        assert_eq!(err, "offline");
        assert_eq!(handler.0, 0, "nothing reported after the failure");
    }
}
