//! Run-scoped, append-only record of attempts, errors and timed events.
//!
//! A [`Ledger`] is created by the orchestrator at the start of a run and is
//! handed by reference to the planner and retry controller. Nothing is ever
//! removed or rewritten; [`RunMetrics`] and [`ErrorSummary`] are views
//! recomputed from the recorded entries on demand.

#[allow(clippy::module_inception)]
mod ledger;
mod metrics;
mod types;

pub use ledger::{Ledger, LedgerSnapshot};
pub use metrics::{overall_status, ErrorSummary, LanguageMetrics, OverallStatus, RunMetrics};
pub use types::{
    ErrorRecord, ExecutionResult, FinalStatus, LedgerEvent, LedgerEventKind, TaskAttempt,
};
