use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::EngineError;
use crate::executor::{ExecutorAdapter, ExecutorResolver};
use crate::ledger::{ExecutionResult, FinalStatus, Ledger, LedgerEventKind};
use crate::observe::{RunEvent, RunObserver};
use crate::plan::DependencyPlanItem;
use crate::retry::RetryController;

pub const FAIL_FAST_NOTE: &str = "skipped after earlier failure (fail-fast)";
pub const CANCELLED_BEFORE_START: &str = "cancelled before start";

/// Drives plan items one at a time, in plan order.
pub struct ExecutionPlanner {
    controller: RetryController,
    continue_on_failure: bool,
}

impl ExecutionPlanner {
    pub fn new(controller: RetryController, continue_on_failure: bool) -> Self {
        Self {
            controller,
            continue_on_failure,
        }
    }

    /// Every item ends with exactly one terminal result, in plan order.
    ///
    /// Executors are resolved for the whole plan before anything runs, so a
    /// missing adapter is reported without side effects.
    pub async fn run(
        &self,
        items: &[DependencyPlanItem],
        resolver: &dyn ExecutorResolver,
        ledger: &Ledger,
        observer: &dyn RunObserver,
        cancel: &CancellationToken,
    ) -> Result<Vec<ExecutionResult>, EngineError> {
        let executors: Vec<Arc<dyn ExecutorAdapter>> = items
            .iter()
            .map(|item| {
                resolver
                    .resolve(item.language)
                    .ok_or(EngineError::MissingExecutor(item.language))
            })
            .collect::<Result<_, _>>()?;

        let run_id = ledger.run_id().to_string();
        let total = items.len();
        let mut results = Vec::with_capacity(total);
        let mut halted: Option<&'static str> = None;

        for (index, (item, executor)) in items.iter().zip(executors).enumerate() {
            if halted.is_none() && cancel.is_cancelled() {
                tracing::info!(remaining = total - index, "cancellation requested");
                halted = Some(CANCELLED_BEFORE_START);
            }

            let result = match halted {
                Some(reason) => {
                    tracing::info!(language = %item.language, reason, "skipping plan item");
                    ExecutionResult::skipped(item.clone(), reason)
                }
                None => {
                    tracing::info!(
                        language = %item.language,
                        executor = executor.name(),
                        position = index + 1,
                        total,
                        "starting plan item"
                    );
                    ledger.record_event(LedgerEventKind::ItemStarted {
                        language: item.language,
                    });
                    observer.render(&RunEvent::ItemStart {
                        run_id: run_id.clone(),
                        language: item.language,
                        index,
                        total,
                    });

                    let result = self
                        .controller
                        .attempt(item, executor.as_ref(), ledger, observer, cancel)
                        .await;

                    if result.note.as_deref() == Some(crate::retry::CANCELLED_NOTE) {
                        halted = Some(CANCELLED_BEFORE_START);
                    } else if result.final_status == FinalStatus::FailedExhausted
                        && !self.continue_on_failure
                    {
                        tracing::warn!(language = %item.language, "fail-fast: stopping after failure");
                        halted = Some(FAIL_FAST_NOTE);
                    }
                    result
                }
            };

            ledger.record_result(result.clone())?;
            observer.render(&RunEvent::ItemEnd {
                run_id: run_id.clone(),
                result: result.clone(),
            });
            results.push(result);
        }

        Ok(results)
    }
}
