//! One synchronization pass over a pair of tracker sources.

use std::fmt;

use trackersync_core::{Issue, Side, SourceError, SourceFactory, SyncSettings, TrackerSource};

use crate::error::SyncError;
use crate::planner::{ActionPlan, ActionPlanner, SourcePair};
use crate::reconcile::{reconcile, Decision, ReconcileHandler};

/// Progress of the most recent [`SyncEngine::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    /// Exactly one source is primary.
    Validated,
    /// Both sources connected.
    Connected,
    /// Issue lists reconciled into a plan.
    Diffed,
    /// Every planned action ran.
    Executed,
    Disconnected,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineState::Idle => "idle",
            EngineState::Validated => "validated",
            EngineState::Connected => "connected",
            EngineState::Diffed => "diffed",
            EngineState::Executed => "executed",
            EngineState::Disconnected => "disconnected",
        };
        f.write_str(name)
    }
}

pub struct SyncEngine {
    primary: Box<dyn TrackerSource>,
    secondary: Box<dyn TrackerSource>,
    state: EngineState,
    plan: Option<ActionPlan>,
}

impl SyncEngine {
    /// Sources may be given in any order; roles come from each source's
    /// `is_primary` setting when the run starts.
    pub fn new(first: Box<dyn TrackerSource>, second: Box<dyn TrackerSource>) -> Self {
        Self {
            primary: first,
            secondary: second,
            state: EngineState::Idle,
            plan: None,
        }
    }

    /// Build both configured sources through `factory`.
    pub fn from_settings(
        settings: &SyncSettings,
        factory: &SourceFactory<'_>,
    ) -> Result<Self, SyncError> {
        let (first, second) = factory.create_pair(settings)?;
        Ok(Self::new(first, second))
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// The plan executed by the last successful run.
    pub fn plan(&self) -> Option<&ActionPlan> {
        self.plan.as_ref()
    }

    /// Validate, connect, reconcile, execute and disconnect.
    ///
    /// The first failing source call aborts the run with that error. Actions
    /// applied before the failure are not rolled back, and sources are not
    /// disconnected on the error path.
    pub fn run(&mut self) -> Result<(), SyncError> {
        self.state = EngineState::Idle;
        self.plan = None;

        self.validate()?;
        self.state = EngineState::Validated;
        tracing::info!(
            primary = self.primary.name(),
            secondary = self.secondary.name(),
            "sources validated"
        );

        self.secondary.connect()?;
        self.primary.connect()?;
        self.state = EngineState::Connected;

        let primary_issues = self.primary.list_issues()?;
        let secondary_issues = self.secondary.list_issues()?;
        tracing::info!(
            primary = primary_issues.len(),
            secondary = secondary_issues.len(),
            "issues listed"
        );

        let mut pair = SourcePair {
            primary: self.primary.as_mut(),
            secondary: self.secondary.as_mut(),
        };
        let mut planner = ActionPlanner::new();
        reconcile(
            primary_issues,
            secondary_issues,
            &mut PassHandler {
                pair: &mut pair,
                planner: &mut planner,
            },
        )?;
        let mut plan = planner.into_plan();
        self.state = EngineState::Diffed;
        tracing::info!(actions = plan.len(), "plan ready");

        plan.execute(&mut pair)?;
        self.state = EngineState::Executed;
        self.plan = Some(plan);

        if let Err(e) = self.primary.disconnect() {
            tracing::debug!(source = self.primary.name(), error = %e, "disconnect failed");
        }
        if let Err(e) = self.secondary.disconnect() {
            tracing::debug!(source = self.secondary.name(), error = %e, "disconnect failed");
        }
        self.state = EngineState::Disconnected;
        Ok(())
    }

    /// Require exactly one primary and put it on the primary side.
    fn validate(&mut self) -> Result<(), SyncError> {
        let first = self.primary.settings().is_primary;
        let second = self.secondary.settings().is_primary;
        if first == second {
            return Err(SyncError::PrimaryRole {
                primaries: usize::from(first) + usize::from(second),
            });
        }
        if second {
            std::mem::swap(&mut self.primary, &mut self.secondary);
        }
        Ok(())
    }
}

/// Resolves lookups against the run's sources and feeds the planner.
struct PassHandler<'p, 'a> {
    pair: &'p mut SourcePair<'a>,
    planner: &'p mut ActionPlanner,
}

impl ReconcileHandler for PassHandler<'_, '_> {
    type Error = SourceError;

    fn lookup_issue(&mut self, id: &str, side: Side) -> Result<Option<Issue>, SourceError> {
        self.pair.source(side).get_issue(id)
    }

    fn report_decision(&mut self, decision: Decision) -> Result<(), SourceError> {
        tracing::debug!(
            kind = ?decision.kind,
            side = %decision.side,
            description = %decision.issue.description,
            "decision"
        );
        self.planner.accept(decision);
        Ok(())
    }
}
