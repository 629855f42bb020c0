use std::path::{Path, PathBuf};
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

use super::{match_hints, quoted};

lazy_static! {
    // Network first: offline pip also ends with "No matching distribution found".
    static ref PIP_HINTS: Vec<(Regex, ErrorKind)> = vec![
        (
            Regex::new(r"(?i)NewConnectionError|ConnectTimeoutError|ReadTimeoutError|ProxyError|SSLError|Connection broken|Max retries exceeded")
                .expect("static regex"),
            ErrorKind::NetworkError,
        ),
        (
            Regex::new(r"(?i)ResolutionImpossible|conflicting dependencies|No matching distribution found|Could not find a version that satisfies")
                .expect("static regex"),
            ErrorKind::DependencyConflict,
        ),
        (
            Regex::new(r"(?i)externally-managed-environment|Could not install packages due to an OSError: \[Errno 13\]")
                .expect("static regex"),
            ErrorKind::PermissionDenied,
        ),
        (
            Regex::new(r"(?i)No module named (pip|venv|ensurepip)\b").expect("static regex"),
            ErrorKind::ToolchainMissing,
        ),
    ];
}

fn pip_hint(text: &str) -> Option<ErrorKind> {
    match_hints(&PIP_HINTS, text)
}

const VENV_DIRS: [&str; 2] = ["venv", ".venv"];

/// Interpreter inside a project virtual environment, if one exists.
fn venv_interpreter(dir: &Path) -> Option<PathBuf> {
    VENV_DIRS.iter().find_map(|venv| {
        let root = dir.join(venv);
        [root.join("bin").join("python"), root.join("Scripts").join("python.exe")]
            .into_iter()
            .find(|p| p.is_file())
    })
}

/// pip / poetry / pipenv projects.
pub struct PythonExecutor {
    runner: Arc<dyn CommandRunner>,
}

impl Default for PythonExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl PythonExecutor {
    pub fn new() -> Self {
        Self::with_runner(Arc::new(ShellCommandRunner))
    }

    pub fn with_runner(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl ExecutorAdapter for PythonExecutor {
    fn name(&self) -> &str {
        "python"
    }

    fn language(&self) -> Language {
        Language::Python
    }

    async fn execute(&self, item: &DependencyPlanItem, ctx: &ExecContext<'_>) -> ExecutionOutcome {
        run_command_sequence(self.runner.as_ref(), item, ctx, |out| {
            classify_output(out, pip_hint)
        })
        .await
    }

    fn smoke_checks(&self, item: &DependencyPlanItem) -> Vec<PlanCommand> {
        let interpreter = match venv_interpreter(&item.working_directory) {
            Some(path) => quoted(&path),
            None if cfg!(windows) => "python".to_string(),
            None => "python3".to_string(),
        };
        vec![PlanCommand::new(format!("{interpreter} -c \"import sys\""))]
    }

    fn runner(&self) -> Arc<dyn CommandRunner> {
        self.runner.clone()
    }
}
