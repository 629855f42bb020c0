#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use envsetup_core::config::{EngineConfig, VerifyConfig};
use envsetup_core::executor::{
    run_command_sequence, classify_output, CommandLimits, CommandOutput, CommandRunner,
    ExecContext, ExecutionOutcome, ExecutorAdapter, ExecutorRegistry, ShellCommandRunner,
};
use envsetup_core::plan::{
    DependencyAnalysis, DependencyPlanItem, Language, PlanCommand, ScanInput, StackDetection,
};
use envsetup_core::{ErrorKind, Orchestrator};
use tokio_util::sync::CancellationToken;

pub fn ok() -> ExecutionOutcome {
    ExecutionOutcome::success("done", "")
}

pub fn fail(kind: ErrorKind) -> ExecutionOutcome {
    ExecutionOutcome::failure(kind, Some(1), format!("simulated {kind}"))
}

/// Runner that answers every command with the same exit code.
pub struct StaticRunner {
    pub exit_code: i32,
    pub seen: Mutex<Vec<String>>,
}

impl StaticRunner {
    pub fn new(exit_code: i32) -> Arc<Self> {
        Arc::new(Self {
            exit_code,
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl CommandRunner for StaticRunner {
    fn name(&self) -> &str {
        "static"
    }

    async fn run(&self, command: &str, _cwd: &Path, _limits: &CommandLimits) -> CommandOutput {
        self.seen.lock().unwrap().push(command.to_string());
        CommandOutput::exited(self.exit_code, "", "smoke check output")
    }
}

/// Adapter that replays scripted outcomes, then succeeds.
pub struct ScriptedExecutor {
    language: Language,
    script: Mutex<VecDeque<ExecutionOutcome>>,
    /// Ledger offset at the start of each call.
    pub call_offsets: Mutex<Vec<u64>>,
    cancel_on_call: Option<CancellationToken>,
    smoke: Vec<PlanCommand>,
    runner: Arc<dyn CommandRunner>,
}

impl ScriptedExecutor {
    pub fn new(language: Language, script: Vec<ExecutionOutcome>) -> Self {
        Self {
            language,
            script: Mutex::new(script.into()),
            call_offsets: Mutex::new(Vec::new()),
            cancel_on_call: None,
            smoke: Vec::new(),
            runner: StaticRunner::new(0),
        }
    }

    pub fn succeeding(language: Language) -> Self {
        Self::new(language, Vec::new())
    }

    /// Fire `token` at the end of the first call.
    pub fn cancelling(mut self, token: CancellationToken) -> Self {
        self.cancel_on_call = Some(token);
        self
    }

    pub fn with_smoke_checks(mut self, checks: Vec<&str>, runner: Arc<dyn CommandRunner>) -> Self {
        self.smoke = checks.into_iter().map(PlanCommand::new).collect();
        self.runner = runner;
        self
    }

    pub fn calls(&self) -> usize {
        self.call_offsets.lock().unwrap().len()
    }
}

#[async_trait]
impl ExecutorAdapter for ScriptedExecutor {
    fn name(&self) -> &str {
        "scripted"
    }

    fn language(&self) -> Language {
        self.language
    }

    async fn execute(&self, _item: &DependencyPlanItem, ctx: &ExecContext<'_>) -> ExecutionOutcome {
        self.call_offsets.lock().unwrap().push(ctx.ledger.offset_ms());
        let outcome = self.script.lock().unwrap().pop_front().unwrap_or_else(ok);
        if let Some(token) = &self.cancel_on_call {
            token.cancel();
        }
        outcome
    }

    fn smoke_checks(&self, _item: &DependencyPlanItem) -> Vec<PlanCommand> {
        self.smoke.clone()
    }

    fn runner(&self) -> Arc<dyn CommandRunner> {
        self.runner.clone()
    }
}

/// Real-shell adapter with no ecosystem knowledge.
pub struct ShellExecutor {
    pub language: Language,
}

#[async_trait]
impl ExecutorAdapter for ShellExecutor {
    fn name(&self) -> &str {
        "shell"
    }

    fn language(&self) -> Language {
        self.language
    }

    async fn execute(&self, item: &DependencyPlanItem, ctx: &ExecContext<'_>) -> ExecutionOutcome {
        run_command_sequence(&ShellCommandRunner, item, ctx, |o| classify_output(o, |_| None)).await
    }

    fn runner(&self) -> Arc<dyn CommandRunner> {
        Arc::new(ShellCommandRunner)
    }
}

pub fn detection(language: Language) -> StackDetection {
    StackDetection {
        language,
        confidence: 1.0,
        manifest_paths: Vec::new(),
        package_manager: None,
    }
}

pub fn scan_input(languages: &[Language]) -> ScanInput {
    ScanInput {
        project_path: None,
        detections: languages.iter().copied().map(detection).collect(),
        analysis: DependencyAnalysis {
            items: languages
                .iter()
                .map(|l| DependencyPlanItem::new(*l, ".", [PlanCommand::new(format!("install {l}"))]))
                .collect(),
        },
    }
}

pub fn orchestrator(executors: Vec<Arc<ScriptedExecutor>>, engine: EngineConfig) -> Orchestrator {
    orchestrator_with_verify(executors, engine, VerifyConfig::default())
}

pub fn orchestrator_with_verify(
    executors: Vec<Arc<ScriptedExecutor>>,
    engine: EngineConfig,
    verify: VerifyConfig,
) -> Orchestrator {
    let registry = executors
        .into_iter()
        .fold(ExecutorRegistry::new(), |reg, exec| reg.register(exec));
    Orchestrator::builder()
        .engine_config(engine)
        .verify_config(verify)
        .resolver(Arc::new(registry))
        .build()
        .unwrap()
}
