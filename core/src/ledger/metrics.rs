use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::types::{
    ErrorRecord, ExecutionResult, FinalStatus, LedgerEvent, LedgerEventKind, TaskAttempt,
};
use crate::error::ErrorKind;
use crate::plan::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Succeeded,
    PartialFailure,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageMetrics {
    pub attempt_count: u32,
    pub successful_attempts: u32,
    pub total_duration_ms: u64,
    /// Successful attempts divided by attempts, 0.0 when nothing ran.
    pub success_rate: f64,
    /// Commands run across all attempts, best-effort ones included.
    pub commands_run: u32,
    /// Commands that succeeded in the latest attempt.
    pub steps_completed: u32,
    /// Commands in the plan item.
    pub steps_total: u32,
    pub final_status: Option<FinalStatus>,
}

/// Derived view over the ledger. Never stored as authoritative state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub per_language: BTreeMap<Language, LanguageMetrics>,
    pub total_duration_ms: u64,
    pub overall_status: OverallStatus,
}

impl RunMetrics {
    pub fn derive(
        attempts: &[TaskAttempt],
        results: &[ExecutionResult],
        events: &[LedgerEvent],
        total_duration_ms: u64,
    ) -> Self {
        let mut per_language: BTreeMap<Language, LanguageMetrics> = BTreeMap::new();

        for a in attempts {
            let m = per_language.entry(a.language).or_insert_with(empty_metrics);
            m.attempt_count += 1;
            m.total_duration_ms = m.total_duration_ms.saturating_add(a.duration_ms);
            if a.succeeded() {
                m.successful_attempts += 1;
            }
        }

        // (attempt number, successful commands) of the latest attempt seen
        let mut latest: BTreeMap<Language, (u32, u32)> = BTreeMap::new();
        for e in events {
            let LedgerEventKind::CommandFinished {
                language,
                attempt_number,
                success,
                ..
            } = &e.kind
            else {
                continue;
            };
            per_language
                .entry(*language)
                .or_insert_with(empty_metrics)
                .commands_run += 1;
            let slot = latest.entry(*language).or_insert((*attempt_number, 0));
            if *attempt_number > slot.0 {
                *slot = (*attempt_number, 0);
            }
            if *attempt_number == slot.0 && *success {
                slot.1 += 1;
            }
        }
        for (language, (_, completed)) in latest {
            if let Some(m) = per_language.get_mut(&language) {
                m.steps_completed = completed;
            }
        }

        for r in results {
            let m = per_language.entry(r.language()).or_insert_with(empty_metrics);
            m.final_status = Some(r.final_status);
            m.steps_total = r.plan_item.ordered_commands.len() as u32;
        }

        for m in per_language.values_mut() {
            m.success_rate = if m.attempt_count == 0 {
                0.0
            } else {
                f64::from(m.successful_attempts) / f64::from(m.attempt_count)
            };
        }

        Self {
            per_language,
            total_duration_ms,
            overall_status: overall_status(results),
        }
    }
}

fn empty_metrics() -> LanguageMetrics {
    LanguageMetrics {
        attempt_count: 0,
        successful_attempts: 0,
        total_duration_ms: 0,
        success_rate: 0.0,
        commands_run: 0,
        steps_completed: 0,
        steps_total: 0,
        final_status: None,
    }
}

/// `Failed` when every item failed, `PartialFailure` when anything failed or
/// was skipped, `Succeeded` otherwise (including an empty plan).
pub fn overall_status(results: &[ExecutionResult]) -> OverallStatus {
    let failed = results
        .iter()
        .filter(|r| r.final_status == FinalStatus::FailedExhausted)
        .count();
    let skipped = results
        .iter()
        .filter(|r| r.final_status == FinalStatus::Skipped)
        .count();

    if !results.is_empty() && failed == results.len() {
        OverallStatus::Failed
    } else if failed > 0 || skipped > 0 {
        OverallStatus::PartialFailure
    } else {
        OverallStatus::Succeeded
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorSummary {
    pub total: usize,
    pub by_kind: BTreeMap<ErrorKind, usize>,
    pub by_language: BTreeMap<Language, usize>,
}

impl ErrorSummary {
    pub fn from_records(records: &[ErrorRecord]) -> Self {
        let mut summary = Self {
            total: records.len(),
            ..Self::default()
        };
        for r in records {
            *summary.by_kind.entry(r.error_kind).or_insert(0) += 1;
            *summary.by_language.entry(r.language).or_insert(0) += 1;
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::plan::DependencyPlanItem;

    fn command(language: Language, attempt_number: u32, step: usize, success: bool) -> LedgerEvent {
        LedgerEvent {
            offset_ms: 0,
            timestamp: Utc::now(),
            kind: LedgerEventKind::CommandFinished {
                language,
                attempt_number,
                step,
                command: format!("step {step}"),
                success,
                best_effort: false,
                duration_ms: 25,
            },
        }
    }

    #[test]
    fn step_counts_follow_the_latest_attempt() {
        let item = DependencyPlanItem::new(Language::Node, ".", ["npm ci", "npm run build", "npm test"]);
        let results = [ExecutionResult {
            plan_item: item,
            final_status: FinalStatus::Succeeded,
            attempts: Vec::new(),
            note: None,
        }];
        let events = [
            command(Language::Node, 1, 1, true),
            command(Language::Node, 1, 2, false),
            command(Language::Node, 2, 1, true),
            command(Language::Node, 2, 2, true),
            command(Language::Node, 2, 3, true),
        ];

        let metrics = RunMetrics::derive(&[], &results, &events, 100);
        let node = &metrics.per_language[&Language::Node];
        assert_eq!(node.commands_run, 5);
        assert_eq!(node.steps_completed, 3);
        assert_eq!(node.steps_total, 3);
    }

    fn result(lang: Language, status: FinalStatus) -> ExecutionResult {
        ExecutionResult {
            plan_item: DependencyPlanItem::new(lang, ".", ["true"]),
            final_status: status,
            attempts: Vec::new(),
            note: None,
        }
    }

    #[test]
    fn overall_status_rules() {
        use FinalStatus::*;
        assert_eq!(overall_status(&[]), OverallStatus::Succeeded);
        assert_eq!(
            overall_status(&[result(Language::Java, Succeeded)]),
            OverallStatus::Succeeded
        );
        assert_eq!(
            overall_status(&[
                result(Language::Java, FailedExhausted),
                result(Language::Node, Succeeded)
            ]),
            OverallStatus::PartialFailure
        );
        assert_eq!(
            overall_status(&[
                result(Language::Java, FailedExhausted),
                result(Language::Node, FailedExhausted)
            ]),
            OverallStatus::Failed
        );
        assert_eq!(
            overall_status(&[
                result(Language::Java, Succeeded),
                result(Language::Node, Skipped)
            ]),
            OverallStatus::PartialFailure
        );
    }
}
