//! Turning reconciliation decisions into an ordered list of source calls.

use std::fmt;

use trackersync_core::{Issue, IssueFields, Side, SourceError, TrackerSource};

use crate::reconcile::{Decision, DecisionKind};

/// The source call an action makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOp {
    Add,
    Update(IssueFields),
    Close,
}

impl fmt::Display for SyncOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOp::Add => write!(f, "add"),
            SyncOp::Update(fields) => write!(f, "update({fields})"),
            SyncOp::Close => write!(f, "close"),
        }
    }
}

/// One planned call against one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncAction {
    pub side: Side,
    pub op: SyncOp,
    /// Index into [`ActionPlan::issues`].
    pub issue: usize,
}

/// Both sources of a run, addressable by [`Side`].
pub struct SourcePair<'a> {
    pub primary: &'a mut dyn TrackerSource,
    pub secondary: &'a mut dyn TrackerSource,
}

impl<'a> SourcePair<'a> {
    pub fn source(&mut self, side: Side) -> &mut dyn TrackerSource {
        match side {
            Side::Primary => &mut *self.primary,
            Side::Secondary => &mut *self.secondary,
        }
    }
}

/// Actions in execution order plus the issues they operate on.
///
/// An add and the id update that follows it share one issue slot, so the
/// identifier assigned by the add is what the update sends.
#[derive(Debug, Default)]
pub struct ActionPlan {
    pub issues: Vec<Issue>,
    pub actions: Vec<SyncAction>,
}

impl ActionPlan {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Issue an action operates on.
    pub fn issue(&self, action: &SyncAction) -> &Issue {
        &self.issues[action.issue]
    }

    /// Run every action in order. The first failure stops execution; actions
    /// already applied stay applied.
    pub fn execute(&mut self, pair: &mut SourcePair<'_>) -> Result<(), SourceError> {
        for (n, action) in self.actions.iter().enumerate() {
            let issue = &mut self.issues[action.issue];
            let source = pair.source(action.side);
            tracing::debug!(
                step = n,
                side = %action.side,
                source = source.name(),
                op = %action.op,
                description = %issue.description,
                "executing action"
            );
            match action.op {
                SyncOp::Add => source.add_issue(issue)?,
                SyncOp::Update(fields) => source.update_issue(issue, fields)?,
                SyncOp::Close => source.close_issue(issue)?,
            }
        }
        Ok(())
    }
}

/// Accumulates an [`ActionPlan`] from decisions as they arrive.
#[derive(Debug, Default)]
pub struct ActionPlanner {
    plan: ActionPlan,
}

impl ActionPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Close on S becomes a close on S. Add on S becomes an add on S, and
    /// when S is the primary side also an id update on the secondary side
    /// so it records the identifier the primary assigns.
    pub fn accept(&mut self, decision: Decision) {
        let Decision { kind, side, issue } = decision;
        let slot = self.plan.issues.len();
        self.plan.issues.push(issue);

        match kind {
            DecisionKind::Close => self.push(side, SyncOp::Close, slot),
            DecisionKind::Add => {
                self.push(side, SyncOp::Add, slot);
                if side == Side::Primary {
                    self.push(side.other(), SyncOp::Update(IssueFields::ID), slot);
                }
            }
        }
    }

    fn push(&mut self, side: Side, op: SyncOp, issue: usize) {
        self.plan.actions.push(SyncAction { side, op, issue });
    }

    pub fn plan(&self) -> &ActionPlan {
        &self.plan
    }

    pub fn into_plan(self) -> ActionPlan {
        self.plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackersync_core::memory::{Call, MemorySource};
    use trackersync_core::IssueState;

    fn decision(kind: DecisionKind, side: Side, id: &str) -> Decision {
        Decision {
            kind,
            side,
            issue: Issue::new(id, "Fix crash", IssueState::Open),
        }
    }

    #[test]
    fn close_maps_to_single_close() {
        let mut planner = ActionPlanner::new();
        planner.accept(decision(DecisionKind::Close, Side::Secondary, "3"));

        let plan = planner.into_plan();
        assert_eq!(
            plan.actions,
            vec![SyncAction {
                side: Side::Secondary,
                op: SyncOp::Close,
                issue: 0
            }]
        );
    }

    #[test]
    fn add_on_primary_is_followed_by_id_update_on_same_slot() {
        let mut planner = ActionPlanner::new();
        planner.accept(decision(DecisionKind::Add, Side::Primary, ""));

        let plan = planner.into_plan();
        assert_eq!(plan.issues.len(), 1);
        assert_eq!(
            plan.actions,
            vec![
                SyncAction {
                    side: Side::Primary,
                    op: SyncOp::Add,
                    issue: 0
                },
                SyncAction {
                    side: Side::Secondary,
                    op: SyncOp::Update(IssueFields::ID),
                    issue: 0
                },
            ]
        );
    }

    #[test]
    fn add_on_secondary_has_no_update() {
        let mut planner = ActionPlanner::new();
        planner.accept(decision(DecisionKind::Add, Side::Secondary, "9"));
        assert_eq!(planner.plan().len(), 1);
        assert_eq!(planner.plan().actions[0].op, SyncOp::Add);
    }

    #[test]
    fn execute_sends_assigned_id_to_secondary() {
        let mut primary = MemorySource::new("hub", true).with_next_ids(["101"]);
        let mut secondary = MemorySource::new("board", false)
            .with_issue(Issue::new("", "Fix crash", IssueState::Open));
        let secondary_log = secondary.journal();

        let mut planner = ActionPlanner::new();
        planner.accept(decision(DecisionKind::Add, Side::Primary, ""));
        let mut plan = planner.into_plan();

        let mut pair = SourcePair {
            primary: &mut primary,
            secondary: &mut secondary,
        };
        plan.execute(&mut pair).unwrap();

        assert_eq!(plan.issues[0].id, "101");
        assert_eq!(
            secondary_log.writes(),
            vec![Call::Update("101".into(), IssueFields::ID)]
        );
    }
}
