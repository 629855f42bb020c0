use std::sync::Arc;

use async_trait::async_trait;
use envsetup_core::executor::{
    classify_output, run_command_sequence, CommandRunner, ExecContext, ExecutionOutcome,
    ExecutorAdapter, ShellCommandRunner,
};
use envsetup_core::plan::{DependencyPlanItem, Language, PlanCommand};
use envsetup_core::ErrorKind;
use lazy_static::lazy_static;
use regex::Regex;

use super::match_hints;

lazy_static! {
    static ref NPM_HINTS: Vec<(Regex, ErrorKind)> = vec![
        (
            Regex::new(r"(?i)\b(ECONNREFUSED|ECONNRESET|ETIMEDOUT|EAI_AGAIN|EINTEGRITY)\b|trouble with your network connection|ERR_PNPM_FETCH_|ERR_PNPM_META_FETCH_FAIL")
                .expect("static regex"),
            ErrorKind::NetworkError,
        ),
        (
            Regex::new(r"(?i)\b(ERESOLVE|E404|ETARGET)\b|ERR_PNPM_PEER_DEP_ISSUES|ERR_PNPM_NO_MATCHING_VERSION|Couldn't find any versions for")
                .expect("static regex"),
            ErrorKind::DependencyConflict,
        ),
        (
            Regex::new(r"(?i)\bEACCES\b|\bEPERM\b").expect("static regex"),
            ErrorKind::PermissionDenied,
        ),
    ];
}

fn npm_hint(text: &str) -> Option<ErrorKind> {
    match_hints(&NPM_HINTS, text)
}

/// npm / yarn / pnpm projects.
pub struct NodeExecutor {
    runner: Arc<dyn CommandRunner>,
}

impl Default for NodeExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeExecutor {
    pub fn new() -> Self {
        Self::with_runner(Arc::new(ShellCommandRunner))
    }

    pub fn with_runner(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl ExecutorAdapter for NodeExecutor {
    fn name(&self) -> &str {
        "node"
    }

    fn language(&self) -> Language {
        Language::Node
    }

    async fn execute(&self, item: &DependencyPlanItem, ctx: &ExecContext<'_>) -> ExecutionOutcome {
        run_command_sequence(self.runner.as_ref(), item, ctx, |out| {
            classify_output(out, npm_hint)
        })
        .await
    }

    fn smoke_checks(&self, item: &DependencyPlanItem) -> Vec<PlanCommand> {
        let mut checks = vec![PlanCommand::new("node --version")];
        if let Some(pm @ ("yarn" | "pnpm")) = item.package_manager.as_deref() {
            checks.push(PlanCommand::new(format!("{pm} --version")));
        }
        if item.working_directory.join("package.json").is_file() {
            checks.push(PlanCommand::new(
                "node -e \"process.exit(require('fs').existsSync('node_modules') ? 0 : 1)\"",
            ));
        }
        checks
    }

    fn runner(&self) -> Arc<dyn CommandRunner> {
        self.runner.clone()
    }
}

#[cfg(test)]
mod tests {
    use envsetup_core::ledger::Ledger;

    use super::*;
    use crate::executor::adapters::testing::{ctx, ScriptedRunner};

    #[tokio::test]
    async fn eresolve_is_a_dependency_conflict() {
        let runner = ScriptedRunner::failing("npm ERR! code ERESOLVE\nnpm ERR! ERESOLVE unable to resolve dependency tree");
        let exec = NodeExecutor::with_runner(runner.clone());
        let item = DependencyPlanItem::new(Language::Node, ".", ["npm ci"]);
        let ledger = Ledger::new("t");

        let outcome = exec.execute(&item, &ctx(&ledger)).await;
        assert_eq!(outcome.error_kind, Some(ErrorKind::DependencyConflict));
    }

    #[tokio::test]
    async fn registry_timeout_is_a_network_error() {
        let runner = ScriptedRunner::failing("npm ERR! code ETIMEDOUT\nnpm ERR! network request to https://registry.npmjs.org/left-pad failed");
        let exec = NodeExecutor::with_runner(runner);
        let item = DependencyPlanItem::new(Language::Node, ".", ["npm install"]);
        let ledger = Ledger::new("t");

        let outcome = exec.execute(&item, &ctx(&ledger)).await;
        assert_eq!(outcome.error_kind, Some(ErrorKind::NetworkError));
        assert_eq!(outcome.failed_command.as_deref(), Some("npm install"));
    }

    #[tokio::test]
    async fn all_commands_run_in_order() {
        let runner = ScriptedRunner::new(Vec::new());
        let exec = NodeExecutor::with_runner(runner.clone());
        let item = DependencyPlanItem::new(Language::Node, ".", ["npm ci", "npm run build"]);
        let ledger = Ledger::new("t");

        let outcome = exec.execute(&item, &ctx(&ledger)).await;
        assert!(outcome.is_success());
        assert_eq!(*runner.seen.lock().unwrap(), vec!["npm ci", "npm run build"]);
    }

    #[test]
    fn smoke_checks_follow_package_manager() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        let item = DependencyPlanItem::new(Language::Node, dir.path(), ["pnpm install"])
            .with_package_manager("pnpm");

        let checks: Vec<String> = NodeExecutor::new()
            .smoke_checks(&item)
            .into_iter()
            .map(|c| c.run)
            .collect();
        assert_eq!(checks[0], "node --version");
        assert_eq!(checks[1], "pnpm --version");
        assert!(checks[2].contains("node_modules"));
    }

    #[test]
    fn npm_projects_without_manifest_only_check_node() {
        let dir = tempfile::tempdir().unwrap();
        let item = DependencyPlanItem::new(Language::Node, dir.path(), ["npm ci"]);
        assert_eq!(NodeExecutor::new().smoke_checks(&item).len(), 1);
    }
}
