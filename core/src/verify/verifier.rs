use tokio_util::sync::CancellationToken;

use super::types::{CheckOutcome, VerificationEntry, VerificationReport, VerificationStatus};
use crate::executor::{CommandLimits, ExecutorResolver};
use crate::ledger::{ExecutionResult, FinalStatus, Ledger, LedgerEventKind};
use crate::observe::{RunEvent, RunObserver};
use crate::util::tail_str;

const CHECK_TAIL_BYTES: usize = 512;

pub struct Verifier {
    limits: CommandLimits,
}

impl Verifier {
    pub fn new(limits: CommandLimits) -> Self {
        Self { limits }
    }

    pub async fn verify(
        &self,
        results: &[ExecutionResult],
        resolver: &dyn ExecutorResolver,
        ledger: &Ledger,
        observer: &dyn RunObserver,
        cancel: &CancellationToken,
    ) -> VerificationReport {
        let mut entries = Vec::with_capacity(results.len());
        for result in results {
            let entry = self.verify_one(result, resolver, cancel).await;
            if entry.status != VerificationStatus::NotApplicable {
                ledger.record_event(LedgerEventKind::Verified {
                    language: entry.language,
                    usable: entry.usable,
                });
            }
            observer.render(&RunEvent::Verified {
                run_id: ledger.run_id().to_string(),
                entry: entry.clone(),
            });
            entries.push(entry);
        }
        VerificationReport::from_entries(entries)
    }

    async fn verify_one(
        &self,
        result: &ExecutionResult,
        resolver: &dyn ExecutorResolver,
        cancel: &CancellationToken,
    ) -> VerificationEntry {
        let item = &result.plan_item;
        let language = item.language;

        if result.final_status != FinalStatus::Succeeded {
            let detail = match result.final_status {
                FinalStatus::Skipped => "skipped, not verified",
                _ => "install failed, not verified",
            };
            return VerificationEntry::not_applicable(language, detail);
        }

        let unverified = |detail: String, checks: Vec<CheckOutcome>| VerificationEntry {
            language,
            status: VerificationStatus::Unverified,
            usable: false,
            detail,
            checks,
        };

        if cancel.is_cancelled() {
            return unverified("verification skipped: cancelled".into(), Vec::new());
        }

        let Some(executor) = resolver.resolve(language) else {
            return unverified(format!("no executor registered for {language}"), Vec::new());
        };

        let runner = executor.runner();
        let mut checks = Vec::new();

        for command in executor.smoke_checks(item) {
            let output = runner
                .run(&command.run, &item.working_directory, &self.limits)
                .await;
            let passed = output.success();
            let tail = if passed {
                String::new()
            } else {
                tail_str(output.stderr_tail.trim(), CHECK_TAIL_BYTES)
            };
            checks.push(CheckOutcome {
                check: command.run.clone(),
                passed,
                exit_status: output.exit_code,
                output_tail: tail,
            });
        }

        for artifact in &item.expected_artifacts {
            let path = item.working_directory.join(artifact);
            let passed = tokio::fs::metadata(&path).await.is_ok();
            checks.push(CheckOutcome {
                check: format!("exists {}", artifact.display()),
                passed,
                exit_status: None,
                output_tail: String::new(),
            });
        }

        let failed: Vec<&str> = checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.check.as_str())
            .collect();

        if failed.is_empty() {
            tracing::info!(language = %language, checks = checks.len(), "environment verified");
            VerificationEntry {
                language,
                status: VerificationStatus::Verified,
                usable: true,
                detail: format!("{} check(s) passed", checks.len()),
                checks,
            }
        } else {
            tracing::warn!(language = %language, failed = ?failed, "succeeded but unverified");
            let detail = format!("failed check(s): {}", failed.join(", "));
            unverified(detail, checks)
        }
    }
}
