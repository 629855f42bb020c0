use chrono::Local;
use envsetup_core::observe::{RunEvent, RunObserver};
use serde_json::{json, Value};

/// One JSON object per event, on stderr.
pub struct JsonlRendererPlugin {
    pretty_print: bool,
}

impl JsonlRendererPlugin {
    pub fn new(pretty_print: bool) -> Self {
        Self { pretty_print }
    }

    fn event_to_json(&self, event: &RunEvent) -> Value {
        let ts = Local::now().to_rfc3339();
        let run_id = event.run_id();
        match event {
            RunEvent::RunStart { planned, .. } => json!({
                "v": 1,
                "event_type": "run.start",
                "ts": ts,
                "run_id": run_id,
                "metadata": { "planned": planned }
            }),
            RunEvent::Plan { languages, .. } => json!({
                "v": 1,
                "event_type": "executor.plan",
                "ts": ts,
                "run_id": run_id,
                "metadata": { "order": languages }
            }),
            RunEvent::ItemStart {
                language,
                index,
                total,
                ..
            } => json!({
                "v": 1,
                "event_type": "item.start",
                "ts": ts,
                "run_id": run_id,
                "language": language,
                "metadata": { "index": index, "total": total }
            }),
            RunEvent::AttemptEnd {
                attempt,
                will_retry,
                ..
            } => json!({
                "v": 1,
                "event_type": "attempt.end",
                "ts": ts,
                "run_id": run_id,
                "language": attempt.language,
                "code": attempt.exit_status,
                "metadata": {
                    "attempt": attempt.attempt_number,
                    "duration_ms": attempt.duration_ms,
                    "error_kind": attempt.error_kind,
                    "failed_command": attempt.failed_command,
                    "will_retry": will_retry,
                }
            }),
            RunEvent::Backoff {
                language,
                attempt_number,
                delay_ms,
                ..
            } => json!({
                "v": 1,
                "event_type": "retry.backoff",
                "ts": ts,
                "run_id": run_id,
                "language": language,
                "metadata": { "after_attempt": attempt_number, "delay_ms": delay_ms }
            }),
            RunEvent::ItemEnd { result, .. } => json!({
                "v": 1,
                "event_type": "item.end",
                "ts": ts,
                "run_id": run_id,
                "language": result.language(),
                "metadata": {
                    "final_status": result.final_status,
                    "attempts": result.attempts.len(),
                    "note": result.note,
                }
            }),
            RunEvent::Verified { entry, .. } => json!({
                "v": 1,
                "event_type": "verify.result",
                "ts": ts,
                "run_id": run_id,
                "language": entry.language,
                "metadata": {
                    "status": entry.status,
                    "usable": entry.usable,
                    "detail": entry.detail,
                }
            }),
            RunEvent::RunEnd {
                overall_status,
                total_duration_ms,
                ..
            } => json!({
                "v": 1,
                "event_type": "run.end",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "overall_status": overall_status,
                    "duration_ms": total_duration_ms,
                }
            }),
        }
    }
}

impl RunObserver for JsonlRendererPlugin {
    fn name(&self) -> &str {
        "jsonl-renderer"
    }

    fn format(&self) -> &str {
        "jsonl"
    }

    fn render(&self, event: &RunEvent) {
        let value = self.event_to_json(event);
        let line = if self.pretty_print {
            serde_json::to_string_pretty(&value)
        } else {
            serde_json::to_string(&value)
        };
        eprintln!("{}", line.unwrap_or_else(|_| "{}".into()));
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use envsetup_core::ledger::{OverallStatus, TaskAttempt};
    use envsetup_core::plan::Language;
    use envsetup_core::ErrorKind;

    use super::*;

    #[test]
    fn test_jsonl_renderer_event_type() {
        let renderer = JsonlRendererPlugin::new(false);
        let event = RunEvent::RunStart {
            run_id: "run".to_string(),
            planned: 2,
        };

        let value = renderer.event_to_json(&event);
        assert_eq!(value["v"], 1);
        assert_eq!(value["event_type"], "run.start");
        assert_eq!(value["run_id"], "run");
    }

    #[test]
    fn test_jsonl_renderer_attempt_end() {
        let renderer = JsonlRendererPlugin::new(false);
        let event = RunEvent::AttemptEnd {
            run_id: "run".to_string(),
            attempt: TaskAttempt {
                language: Language::Node,
                attempt_number: 2,
                started_at: Utc::now(),
                ended_at: Utc::now(),
                start_offset_ms: 1000,
                duration_ms: 12,
                exit_status: Some(1),
                stdout_tail: String::new(),
                stderr_tail: "ETIMEDOUT".into(),
                error_kind: Some(ErrorKind::NetworkError),
                failed_command: Some("npm ci".into()),
            },
            will_retry: true,
        };

        let value = renderer.event_to_json(&event);
        assert_eq!(value["event_type"], "attempt.end");
        assert_eq!(value["language"], "node");
        assert_eq!(value["metadata"]["error_kind"], "network_error");
        assert_eq!(value["metadata"]["will_retry"], true);
    }

    #[test]
    fn test_jsonl_renderer_run_end() {
        let renderer = JsonlRendererPlugin::new(false);
        let event = RunEvent::RunEnd {
            run_id: "run".to_string(),
            overall_status: OverallStatus::PartialFailure,
            total_duration_ms: 42,
        };

        let value = renderer.event_to_json(&event);
        assert_eq!(value["event_type"], "run.end");
        assert_eq!(value["metadata"]["overall_status"], "partial_failure");
    }
}
