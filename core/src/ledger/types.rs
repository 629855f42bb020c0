use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;
use crate::plan::{DependencyPlanItem, Language};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalStatus {
    Succeeded,
    FailedExhausted,
    Skipped,
}

/// One executor invocation. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskAttempt {
    pub language: Language,
    /// 1-based, contiguous per plan item.
    pub attempt_number: u32,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// Monotonic offset from run start.
    pub start_offset_ms: u64,
    pub duration_ms: u64,
    pub exit_status: Option<i32>,
    pub stdout_tail: String,
    pub stderr_tail: String,
    pub error_kind: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_command: Option<String>,
}

impl TaskAttempt {
    pub fn succeeded(&self) -> bool {
        self.error_kind.is_none()
    }

    /// Short human-readable cause, used as the error record message.
    pub fn failure_message(&self) -> String {
        let cmd = self
            .failed_command
            .as_deref()
            .map(|c| format!("`{c}` "))
            .unwrap_or_default();
        let last_line = self
            .stderr_tail
            .lines()
            .rev()
            .map(str::trim)
            .find(|l| !l.is_empty());
        match (self.exit_status, last_line) {
            (_, Some(line)) => format!("{cmd}failed: {line}"),
            (Some(code), None) => format!("{cmd}exited with status {code}"),
            (None, None) => format!("{cmd}terminated without exit status"),
        }
    }
}

/// Terminal outcome of one plan item. Written at most once per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub plan_item: DependencyPlanItem,
    pub final_status: FinalStatus,
    pub attempts: Vec<TaskAttempt>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ExecutionResult {
    pub fn skipped(plan_item: DependencyPlanItem, note: impl Into<String>) -> Self {
        Self {
            plan_item,
            final_status: FinalStatus::Skipped,
            attempts: Vec::new(),
            note: Some(note.into()),
        }
    }

    pub fn language(&self) -> Language {
        self.plan_item.language
    }

    pub fn succeeded(&self) -> bool {
        self.final_status == FinalStatus::Succeeded
    }

    pub fn last_error_kind(&self) -> Option<ErrorKind> {
        self.attempts.iter().rev().find_map(|a| a.error_kind)
    }
}

/// Appended for every failed attempt, retried or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub timestamp: DateTime<Utc>,
    pub language: Language,
    pub error_kind: ErrorKind,
    pub message: String,
    pub attempt_number: u32,
}

impl ErrorRecord {
    pub fn from_attempt(attempt: &TaskAttempt) -> Option<Self> {
        let error_kind = attempt.error_kind?;
        Some(Self {
            timestamp: attempt.ended_at,
            language: attempt.language,
            error_kind,
            message: attempt.failure_message(),
            attempt_number: attempt.attempt_number,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub offset_ms: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: LedgerEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEventKind {
    RunStarted {
        run_id: String,
        planned: usize,
    },
    ItemStarted {
        language: Language,
    },
    AttemptFinished {
        language: Language,
        attempt_number: u32,
        error_kind: Option<ErrorKind>,
    },
    /// One command of an attempt, in plan order. `step` is 1-based.
    CommandFinished {
        language: Language,
        attempt_number: u32,
        step: usize,
        command: String,
        success: bool,
        best_effort: bool,
        duration_ms: u64,
    },
    BackoffScheduled {
        language: Language,
        attempt_number: u32,
        delay_ms: u64,
    },
    ItemFinished {
        language: Language,
        final_status: FinalStatus,
    },
    ItemSkipped {
        language: Language,
        reason: String,
    },
    Verified {
        language: Language,
        usable: bool,
    },
    RunFinished {
        overall_status: super::OverallStatus,
    },
}
