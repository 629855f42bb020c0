use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use super::types::{CommandLimits, CommandOutput, ExecContext, ExecutionOutcome};
use crate::plan::{DependencyPlanItem, Language, PlanCommand};

/// Runs one shell command line in a directory.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, command: &str, cwd: &Path, limits: &CommandLimits) -> CommandOutput;
}

/// Language-specific install procedure. One call is exactly one attempt;
/// retrying is the controller's job.
#[async_trait]
pub trait ExecutorAdapter: Send + Sync {
    fn name(&self) -> &str;

    fn language(&self) -> Language;

    async fn execute(&self, item: &DependencyPlanItem, ctx: &ExecContext<'_>) -> ExecutionOutcome;

    /// Commands the verifier runs after a successful install.
    fn smoke_checks(&self, _item: &DependencyPlanItem) -> Vec<PlanCommand> {
        Vec::new()
    }

    /// Runner used for smoke checks.
    fn runner(&self) -> Arc<dyn CommandRunner>;
}

pub trait ExecutorResolver: Send + Sync {
    fn resolve(&self, language: Language) -> Option<Arc<dyn ExecutorAdapter>>;
}
