//! Run observers. The engine reports progress through [`RunObserver`];
//! renderers live in the plugins crate.

use std::sync::Arc;

use crate::ledger::{ExecutionResult, OverallStatus, TaskAttempt};
use crate::plan::Language;
use crate::verify::VerificationEntry;

#[derive(Debug, Clone)]
pub enum RunEvent {
    RunStart {
        run_id: String,
        planned: usize,
    },
    Plan {
        run_id: String,
        languages: Vec<Language>,
    },
    ItemStart {
        run_id: String,
        language: Language,
        index: usize,
        total: usize,
    },
    AttemptEnd {
        run_id: String,
        attempt: TaskAttempt,
        will_retry: bool,
    },
    Backoff {
        run_id: String,
        language: Language,
        attempt_number: u32,
        delay_ms: u64,
    },
    ItemEnd {
        run_id: String,
        result: ExecutionResult,
    },
    Verified {
        run_id: String,
        entry: VerificationEntry,
    },
    RunEnd {
        run_id: String,
        overall_status: OverallStatus,
        total_duration_ms: u64,
    },
}

impl RunEvent {
    pub fn run_id(&self) -> &str {
        match self {
            Self::RunStart { run_id, .. }
            | Self::Plan { run_id, .. }
            | Self::ItemStart { run_id, .. }
            | Self::AttemptEnd { run_id, .. }
            | Self::Backoff { run_id, .. }
            | Self::ItemEnd { run_id, .. }
            | Self::Verified { run_id, .. }
            | Self::RunEnd { run_id, .. } => run_id,
        }
    }
}

pub trait RunObserver: Send + Sync {
    fn name(&self) -> &str;
    fn format(&self) -> &str;
    fn render(&self, event: &RunEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {
    fn name(&self) -> &str {
        "noop"
    }

    fn format(&self) -> &str {
        "none"
    }

    fn render(&self, _event: &RunEvent) {}
}

/// Fans one event out to several observers.
#[derive(Default, Clone)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn RunObserver>>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, observer: Arc<dyn RunObserver>) {
        self.observers.push(observer);
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl RunObserver for ObserverSet {
    fn name(&self) -> &str {
        "observer-set"
    }

    fn format(&self) -> &str {
        "multi"
    }

    fn render(&self, event: &RunEvent) {
        for observer in &self.observers {
            observer.render(event);
        }
    }
}
