use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::metrics::{ErrorSummary, RunMetrics};
use super::types::{ErrorRecord, ExecutionResult, LedgerEvent, LedgerEventKind, TaskAttempt};
use crate::error::EngineError;

#[derive(Default)]
struct LedgerInner {
    attempts: Vec<TaskAttempt>,
    errors: Vec<ErrorRecord>,
    results: Vec<ExecutionResult>,
    events: Vec<LedgerEvent>,
}

pub struct Ledger {
    run_id: String,
    started_at: DateTime<Utc>,
    clock: Instant,
    inner: Mutex<LedgerInner>,
}

/// Serializable copy of a ledger, taken at run end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub attempts: Vec<TaskAttempt>,
    pub errors: Vec<ErrorRecord>,
    pub results: Vec<ExecutionResult>,
    pub events: Vec<LedgerEvent>,
}

impl Ledger {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            started_at: Utc::now(),
            clock: Instant::now(),
            inner: Mutex::new(LedgerInner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LedgerInner> {
        match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.clock.elapsed()
    }

    pub fn offset_ms(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }

    pub fn record_event(&self, kind: LedgerEventKind) {
        let event = LedgerEvent {
            offset_ms: self.offset_ms(),
            timestamp: Utc::now(),
            kind,
        };
        self.lock().events.push(event);
    }

    /// Append an attempt, and an error record when it failed.
    ///
    /// Attempt numbers must continue the item's sequence without gaps.
    pub fn record_attempt(&self, attempt: TaskAttempt) -> Result<(), EngineError> {
        let mut inner = self.lock();
        let language = attempt.language;

        if inner.results.iter().any(|r| r.language() == language) {
            return Err(EngineError::Ledger(format!(
                "attempt recorded for {language} after its result was final"
            )));
        }

        let expected = inner
            .attempts
            .iter()
            .filter(|a| a.language == language)
            .count() as u32
            + 1;
        if attempt.attempt_number != expected {
            return Err(EngineError::Ledger(format!(
                "attempt {} for {language} breaks the sequence (expected {expected})",
                attempt.attempt_number
            )));
        }

        if let Some(record) = ErrorRecord::from_attempt(&attempt) {
            inner.errors.push(record);
        }
        inner.events.push(LedgerEvent {
            offset_ms: self.offset_ms(),
            timestamp: Utc::now(),
            kind: LedgerEventKind::AttemptFinished {
                language,
                attempt_number: attempt.attempt_number,
                error_kind: attempt.error_kind,
            },
        });
        inner.attempts.push(attempt);
        Ok(())
    }

    /// Append the terminal result for a plan item. At most once per language.
    pub fn record_result(&self, result: ExecutionResult) -> Result<(), EngineError> {
        let mut inner = self.lock();
        let language = result.language();

        if inner.results.iter().any(|r| r.language() == language) {
            return Err(EngineError::Ledger(format!(
                "result for {language} already recorded"
            )));
        }

        let recorded = inner
            .attempts
            .iter()
            .filter(|a| a.language == language)
            .count();
        if recorded != result.attempts.len() {
            return Err(EngineError::Ledger(format!(
                "result for {language} carries {} attempts but {recorded} were recorded",
                result.attempts.len()
            )));
        }

        let kind = match result.final_status {
            super::FinalStatus::Skipped => LedgerEventKind::ItemSkipped {
                language,
                reason: result.note.clone().unwrap_or_default(),
            },
            status => LedgerEventKind::ItemFinished {
                language,
                final_status: status,
            },
        };
        inner.events.push(LedgerEvent {
            offset_ms: self.offset_ms(),
            timestamp: Utc::now(),
            kind,
        });
        inner.results.push(result);
        Ok(())
    }

    pub fn errors(&self) -> Vec<ErrorRecord> {
        self.lock().errors.clone()
    }

    pub fn events(&self) -> Vec<LedgerEvent> {
        self.lock().events.clone()
    }

    pub fn error_summary(&self) -> ErrorSummary {
        ErrorSummary::from_records(&self.lock().errors)
    }

    pub fn metrics(&self) -> RunMetrics {
        let total = self.offset_ms();
        let inner = self.lock();
        RunMetrics::derive(&inner.attempts, &inner.results, &inner.events, total)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        let inner = self.lock();
        LedgerSnapshot {
            run_id: self.run_id.clone(),
            started_at: self.started_at,
            attempts: inner.attempts.clone(),
            errors: inner.errors.clone(),
            results: inner.results.clone(),
            events: inner.events.clone(),
        }
    }
}
