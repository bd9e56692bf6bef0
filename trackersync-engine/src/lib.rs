//! # trackersync-engine
//!
//! Reconciliation of two tracker sources.
//!
//! [`reconcile`] compares two issue lists and reports decisions,
//! [`planner`] turns decisions into an ordered [`ActionPlan`], and
//! [`engine`] drives one full pass through [`SyncEngine::run`].

pub mod engine;
pub mod error;
pub mod planner;
pub mod reconcile;

pub use engine::{EngineState, SyncEngine};
pub use error::SyncError;
pub use planner::{ActionPlan, ActionPlanner, SourcePair, SyncAction, SyncOp};
pub use reconcile::{reconcile, Decision, DecisionKind, ReconcileHandler};
