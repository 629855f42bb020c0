use envsetup_core::ledger::{FinalStatus, OverallStatus};
use envsetup_core::observe::{RunEvent, RunObserver};
use envsetup_core::verify::VerificationStatus;

/// Line-per-event human output on stderr.
pub struct TextRendererPlugin {
    ascii_only: bool,
}

impl TextRendererPlugin {
    pub fn new(ascii_only: bool) -> Self {
        Self { ascii_only }
    }

    fn mark(&self, ok: bool) -> &'static str {
        match (ok, self.ascii_only) {
            (true, true) => "OK",
            (false, true) => "FAIL",
            (true, false) => "✔",
            (false, false) => "✘",
        }
    }

    fn format_event(&self, event: &RunEvent) -> String {
        match event {
            RunEvent::RunStart { run_id, planned } => {
                format!("RUN START {run_id} ({planned} item(s))")
            }
            RunEvent::Plan { run_id, languages } => {
                let order: Vec<&str> = languages.iter().map(|l| l.as_str()).collect();
                format!("PLAN {run_id}: {}", order.join(" -> "))
            }
            RunEvent::ItemStart {
                language,
                index,
                total,
                ..
            } => format!("[{}/{}] {language}: installing", index + 1, total),
            RunEvent::AttemptEnd {
                attempt,
                will_retry,
                ..
            } => match attempt.error_kind {
                None => format!(
                    "  {} {} attempt {} ({}ms)",
                    self.mark(true),
                    attempt.language,
                    attempt.attempt_number,
                    attempt.duration_ms
                ),
                Some(kind) => {
                    let next = if *will_retry { ", will retry" } else { "" };
                    format!(
                        "  {} {} attempt {} failed: {kind}{next}",
                        self.mark(false),
                        attempt.language,
                        attempt.attempt_number
                    )
                }
            },
            RunEvent::Backoff {
                language, delay_ms, ..
            } => format!("  {language}: waiting {delay_ms}ms before retry"),
            RunEvent::ItemEnd { result, .. } => {
                let status = match result.final_status {
                    FinalStatus::Succeeded => "succeeded",
                    FinalStatus::FailedExhausted => "failed",
                    FinalStatus::Skipped => "skipped",
                };
                let mut line = format!(
                    "{} {}: {status} after {} attempt(s)",
                    self.mark(result.final_status == FinalStatus::Succeeded),
                    result.language(),
                    result.attempts.len()
                );
                if let Some(note) = &result.note {
                    line.push_str(&format!(" ({note})"));
                }
                line
            }
            RunEvent::Verified { entry, .. } => {
                let label = match entry.status {
                    VerificationStatus::Verified => "verified",
                    VerificationStatus::Unverified => "unverified",
                    VerificationStatus::NotApplicable => "not verified",
                };
                format!("VERIFY {}: {label} ({})", entry.language, entry.detail)
            }
            RunEvent::RunEnd {
                run_id,
                overall_status,
                total_duration_ms,
            } => {
                let status = match overall_status {
                    OverallStatus::Succeeded => "SUCCEEDED",
                    OverallStatus::PartialFailure => "PARTIAL FAILURE",
                    OverallStatus::Failed => "FAILED",
                };
                format!("RUN END {run_id}: {status} in {total_duration_ms}ms")
            }
        }
    }
}

impl RunObserver for TextRendererPlugin {
    fn name(&self) -> &str {
        "text-renderer"
    }

    fn format(&self) -> &str {
        "text"
    }

    fn render(&self, event: &RunEvent) {
        eprintln!("{}", self.format_event(event));
    }
}
