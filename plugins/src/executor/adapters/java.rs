use std::path::Path;
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
    static ref BUILD_TOOL_HINTS: Vec<(Regex, ErrorKind)> = vec![
        (
            Regex::new(r"(?i)Could not transfer artifact|Could not GET '|Connect to \S+ failed|UnknownHostException|Connection timed out|Could not download")
                .expect("static regex"),
            ErrorKind::NetworkError,
        ),
        (
            Regex::new(r"(?i)JAVA_HOME is not set|JAVA_HOME is set to an invalid directory|Unsupported class file major version|invalid target release|release version \d+ not supported")
                .expect("static regex"),
            ErrorKind::ToolchainMissing,
        ),
        (
            Regex::new(r"(?i)Could not resolve dependencies|Could not resolve all (files|dependencies)|dependency convergence|Could not find artifact")
                .expect("static regex"),
            ErrorKind::DependencyConflict,
        ),
    ];
}

fn build_tool_hint(text: &str) -> Option<ErrorKind> {
    match_hints(&BUILD_TOOL_HINTS, text)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuildTool {
    Maven,
    Gradle,
}

fn build_tool(item: &DependencyPlanItem) -> Option<BuildTool> {
    match item.package_manager.as_deref() {
        Some("maven" | "mvn") => return Some(BuildTool::Maven),
        Some("gradle" | "gradlew") => return Some(BuildTool::Gradle),
        _ => {}
    }
    let dir = &item.working_directory;
    if dir.join("pom.xml").is_file() {
        Some(BuildTool::Maven)
    } else if dir.join("build.gradle").is_file() || dir.join("build.gradle.kts").is_file() {
        Some(BuildTool::Gradle)
    } else {
        None
    }
}

fn gradle_command(dir: &Path) -> &'static str {
    if cfg!(windows) && dir.join("gradlew.bat").is_file() {
        "gradlew.bat --version"
    } else if dir.join("gradlew").is_file() {
        "./gradlew --version"
    } else {
        "gradle --version"
    }
}

/// Maven / Gradle projects.
pub struct JavaExecutor {
    runner: Arc<dyn CommandRunner>,
}

impl Default for JavaExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl JavaExecutor {
    pub fn new() -> Self {
        Self::with_runner(Arc::new(ShellCommandRunner))
    }

    pub fn with_runner(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl ExecutorAdapter for JavaExecutor {
    fn name(&self) -> &str {
        "java"
    }

    fn language(&self) -> Language {
        Language::Java
    }

    async fn execute(&self, item: &DependencyPlanItem, ctx: &ExecContext<'_>) -> ExecutionOutcome {
        run_command_sequence(self.runner.as_ref(), item, ctx, |out| {
            classify_output(out, build_tool_hint)
        })
        .await
    }

    fn smoke_checks(&self, item: &DependencyPlanItem) -> Vec<PlanCommand> {
        let mut checks = vec![PlanCommand::new("java -version")];
        match build_tool(item) {
            Some(BuildTool::Maven) => checks.push(PlanCommand::new("mvn --version")),
            Some(BuildTool::Gradle) => {
                checks.push(PlanCommand::new(gradle_command(&item.working_directory)))
            }
            None => {}
        }
        checks
    }

    fn runner(&self) -> Arc<dyn CommandRunner> {
        self.runner.clone()
    }
}
