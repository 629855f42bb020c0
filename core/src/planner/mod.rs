//! Plan building and the sequential run loop.

mod build;
mod run;

pub use build::{build_plan, LanguagePriority};
pub use run::{ExecutionPlanner, CANCELLED_BEFORE_START, FAIL_FAST_NOTE};
