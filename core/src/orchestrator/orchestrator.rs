use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::report::RunReport;
use crate::config::{EngineConfig, VerifyConfig};
use crate::error::EngineError;
use crate::executor::{CommandLimits, ExecutorResolver};
use crate::ledger::{Ledger, LedgerEventKind};
use crate::observe::{NoopObserver, RunEvent, RunObserver};
use crate::plan::{DependencyPlanItem, ScanInput};
use crate::planner::{build_plan, ExecutionPlanner, LanguagePriority};
use crate::retry::{RetryController, RetryPolicy, RetryStrategy};
use crate::verify::Verifier;

pub struct Orchestrator {
    engine: EngineConfig,
    verify: VerifyConfig,
    resolver: Arc<dyn ExecutorResolver>,
    retry_strategy: Arc<dyn RetryStrategy>,
    observer: Arc<dyn RunObserver>,
}

pub struct OrchestratorBuilder {
    engine: EngineConfig,
    verify: VerifyConfig,
    resolver: Option<Arc<dyn ExecutorResolver>>,
    retry_strategy: Option<Arc<dyn RetryStrategy>>,
    observer: Option<Arc<dyn RunObserver>>,
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    pub fn engine_config(&self) -> &EngineConfig {
        &self.engine
    }

    fn priority(&self) -> LanguagePriority {
        LanguagePriority::new(self.engine.language_priority.clone())
    }

    fn limits(&self) -> CommandLimits {
        CommandLimits {
            timeout: self.engine.command_timeout(),
            tail_bytes: self.engine.output_tail_bytes,
        }
    }

    /// Build the ordered plan without running anything.
    pub fn plan(&self, input: &ScanInput) -> Result<Vec<DependencyPlanItem>, EngineError> {
        build_plan(
            &input.detections,
            &input.analysis,
            input.project_path.as_deref(),
            &self.priority(),
        )
    }

    /// Run every plan item to a terminal result, then verify.
    ///
    /// Only configuration faults are returned as `Err`; execution failures
    /// are part of the report.
    pub async fn run_all(
        &self,
        input: &ScanInput,
        cancel: CancellationToken,
    ) -> Result<RunReport, EngineError> {
        let plan = self.plan(input)?;

        let run_id = Uuid::new_v4().to_string();
        let ledger = Ledger::new(run_id.clone());
        let observer = self.observer.as_ref();

        tracing::info!(run_id = %run_id, planned = plan.len(), "run started");
        ledger.record_event(LedgerEventKind::RunStarted {
            run_id: run_id.clone(),
            planned: plan.len(),
        });
        observer.render(&RunEvent::RunStart {
            run_id: run_id.clone(),
            planned: plan.len(),
        });
        observer.render(&RunEvent::Plan {
            run_id: run_id.clone(),
            languages: plan.iter().map(|i| i.language).collect(),
        });

        let controller = RetryController::new(self.retry_strategy.clone(), self.limits());
        let planner = ExecutionPlanner::new(controller, self.engine.continue_on_failure);
        let results = planner
            .run(&plan, self.resolver.as_ref(), &ledger, observer, &cancel)
            .await?;

        let verification = if self.verify.enabled {
            let limits = CommandLimits {
                timeout: self.verify.timeout(),
                tail_bytes: self.engine.output_tail_bytes,
            };
            let report = Verifier::new(limits)
                .verify(&results, self.resolver.as_ref(), &ledger, observer, &cancel)
                .await;
            Some(report)
        } else {
            None
        };

        let metrics = ledger.metrics();
        ledger.record_event(LedgerEventKind::RunFinished {
            overall_status: metrics.overall_status,
        });
        observer.render(&RunEvent::RunEnd {
            run_id: run_id.clone(),
            overall_status: metrics.overall_status,
            total_duration_ms: metrics.total_duration_ms,
        });
        tracing::info!(
            run_id = %run_id,
            status = ?metrics.overall_status,
            duration_ms = metrics.total_duration_ms,
            "run finished"
        );

        Ok(RunReport {
            run_id,
            started_at: ledger.started_at(),
            plan,
            results,
            errors: ledger.errors(),
            error_summary: ledger.error_summary(),
            metrics,
            verification,
            cancelled: cancel.is_cancelled(),
            ledger: Some(ledger.snapshot()),
        })
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            engine: EngineConfig::default(),
            verify: VerifyConfig::default(),
            resolver: None,
            retry_strategy: None,
            observer: None,
        }
    }

    pub fn engine_config(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    pub fn verify_config(mut self, verify: VerifyConfig) -> Self {
        self.verify = verify;
        self
    }

    pub fn resolver(mut self, resolver: Arc<dyn ExecutorResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Overrides the exponential policy derived from `engine.retry`.
    pub fn retry_strategy(mut self, strategy: Arc<dyn RetryStrategy>) -> Self {
        self.retry_strategy = Some(strategy);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn build(self) -> Result<Orchestrator, EngineError> {
        let resolver = self
            .resolver
            .ok_or_else(|| EngineError::Config("no executor resolver configured".into()))?;
        let retry_strategy = match self.retry_strategy {
            Some(strategy) => strategy,
            None => Arc::new(RetryPolicy::from_config(&self.engine.retry)?),
        };
        Ok(Orchestrator {
            engine: self.engine,
            verify: self.verify,
            resolver,
            retry_strategy,
            observer: self.observer.unwrap_or_else(|| Arc::new(NoopObserver)),
        })
    }
}
