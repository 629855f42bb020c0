use std::sync::Arc;

use chrono::Utc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::policy::RetryStrategy;
use crate::error::ErrorKind;
use crate::executor::{CommandLimits, ExecContext, ExecutorAdapter};
use crate::ledger::{ExecutionResult, FinalStatus, Ledger, LedgerEventKind, TaskAttempt};
use crate::observe::{RunEvent, RunObserver};
use crate::plan::DependencyPlanItem;

pub const CANCELLED_NOTE: &str = "cancelled";

/// Wraps one executor with bounded retry. Always returns a terminal
/// [`ExecutionResult`]; execution faults never escape as errors.
pub struct RetryController {
    strategy: Arc<dyn RetryStrategy>,
    limits: CommandLimits,
}

impl RetryController {
    pub fn new(strategy: Arc<dyn RetryStrategy>, limits: CommandLimits) -> Self {
        Self { strategy, limits }
    }

    pub async fn attempt(
        &self,
        item: &DependencyPlanItem,
        executor: &dyn ExecutorAdapter,
        ledger: &Ledger,
        observer: &dyn RunObserver,
        cancel: &CancellationToken,
    ) -> ExecutionResult {
        let language = item.language;
        let mut attempts: Vec<TaskAttempt> = Vec::new();
        let mut attempt_number = 1u32;
        tracing::debug!(
            language = %language,
            strategy = self.strategy.name(),
            max_attempts = self.strategy.max_attempts(),
            "retry budget"
        );

        loop {
            let started_at = Utc::now();
            let start_offset_ms = ledger.offset_ms();
            let clock = Instant::now();

            let ctx = ExecContext {
                limits: self.limits,
                attempt_number,
                ledger,
            };
            let outcome = executor.execute(item, &ctx).await;

            let error_kind = if outcome.is_success() {
                None
            } else {
                Some(outcome.error_kind.unwrap_or(ErrorKind::Unknown))
            };

            let attempt = TaskAttempt {
                language,
                attempt_number,
                started_at,
                ended_at: Utc::now(),
                start_offset_ms,
                duration_ms: clock.elapsed().as_millis() as u64,
                exit_status: outcome.exit_status,
                stdout_tail: outcome.stdout_tail,
                stderr_tail: outcome.stderr_tail,
                error_kind,
                failed_command: outcome.failed_command,
            };
            if let Err(e) = ledger.record_attempt(attempt.clone()) {
                tracing::error!(error = %e, "ledger rejected attempt");
            }

            let Some(kind) = error_kind else {
                tracing::info!(
                    language = %language,
                    attempt = attempt_number,
                    executor = executor.name(),
                    "attempt succeeded"
                );
                observer.render(&RunEvent::AttemptEnd {
                    run_id: ledger.run_id().to_string(),
                    attempt: attempt.clone(),
                    will_retry: false,
                });
                attempts.push(attempt);
                return finish(item, FinalStatus::Succeeded, attempts, None);
            };

            let delay = if self.strategy.should_retry(kind) {
                self.strategy.next_delay(attempt_number)
            } else {
                None
            };

            tracing::warn!(
                language = %language,
                attempt = attempt_number,
                error_kind = %kind,
                exit_status = ?attempt.exit_status,
                retry = delay.is_some(),
                "attempt failed"
            );
            observer.render(&RunEvent::AttemptEnd {
                run_id: ledger.run_id().to_string(),
                attempt: attempt.clone(),
                will_retry: delay.is_some(),
            });
            attempts.push(attempt);

            let Some(delay) = delay else {
                return finish(item, FinalStatus::FailedExhausted, attempts, None);
            };

            if cancel.is_cancelled() {
                return finish(
                    item,
                    FinalStatus::FailedExhausted,
                    attempts,
                    Some(CANCELLED_NOTE),
                );
            }

            let delay_ms = delay.as_millis() as u64;
            ledger.record_event(LedgerEventKind::BackoffScheduled {
                language,
                attempt_number,
                delay_ms,
            });
            observer.render(&RunEvent::Backoff {
                run_id: ledger.run_id().to_string(),
                language,
                attempt_number,
                delay_ms,
            });
            tracing::debug!(language = %language, delay_ms, "backing off");

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(language = %language, "cancelled during backoff");
                    return finish(
                        item,
                        FinalStatus::FailedExhausted,
                        attempts,
                        Some(CANCELLED_NOTE),
                    );
                }
                _ = tokio::time::sleep(delay) => {}
            }

            attempt_number += 1;
        }
    }
}

fn finish(
    item: &DependencyPlanItem,
    final_status: FinalStatus,
    attempts: Vec<TaskAttempt>,
    note: Option<&str>,
) -> ExecutionResult {
    ExecutionResult {
        plan_item: item.clone(),
        final_status,
        attempts,
        note: note.map(str::to_string),
    }
}
