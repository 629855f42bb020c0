//! Orchestration and execution engine for multi-language environment setup.
//!
//! # Architecture
//!
//! ```text
//! ScanInput { detections, analysis }
//!   ↓
//! planner::build_plan() → Vec<DependencyPlanItem> (priority order)
//!   ↓
//! ExecutionPlanner::run() → one item at a time
//!   ↓
//! RetryController::attempt() → ExecutorAdapter::execute() per attempt
//!   ↓
//! Ledger (attempts, errors, events) → RunMetrics view
//!   ↓
//! Verifier::verify() → VerificationReport
//!   ↓
//! Orchestrator::run_all() → RunReport
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod ledger;
pub mod observe;
pub mod orchestrator;
pub mod plan;
pub mod planner;
pub mod retry;
pub mod util;
pub mod verify;

pub use error::{EngineError, ErrorKind};
pub use orchestrator::{Orchestrator, OrchestratorBuilder, RunReport};
