//! Top-level driver: one ledger per run, plan → execute → verify → report.

mod orchestrator;
mod report;

pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use report::RunReport;
