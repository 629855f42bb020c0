//! Executor seam: one attempt of one plan item.
//!
//! Adapters (Node, Python, Java) implement [`ExecutorAdapter`] and drive their
//! ordered command list through a [`CommandRunner`]. The shared helpers here
//! handle the sequence semantics (stop at first failure unless best-effort)
//! and map raw process output onto [`crate::ErrorKind`].

mod classify;
mod registry;
mod sequence;
mod shell;
pub mod traits;
pub mod types;

pub use classify::{classify_output, classify_text};
pub use registry::ExecutorRegistry;
pub use sequence::run_command_sequence;
pub use shell::ShellCommandRunner;
pub use traits::{CommandRunner, ExecutorAdapter, ExecutorResolver};
pub use types::{CommandLimits, CommandOutput, ExecContext, ExecutionOutcome, SpawnFailure};
