use std::collections::BTreeSet;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::error::{EngineError, ErrorKind};

/// Decides how many attempts an item gets and how long to wait between them.
pub trait RetryStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Delay before the next attempt, after attempt `attempt` (1-based)
    /// failed. `None` once attempts are used up.
    fn next_delay(&self, attempt: u32) -> Option<Duration>;

    fn max_attempts(&self) -> u32;

    fn should_retry(&self, kind: ErrorKind) -> bool;
}

/// Validated retry policy. Doubles as the default exponential strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_multiplier: f64,
    pub max_backoff: Duration,
    pub retryable: BTreeSet<ErrorKind>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(30),
            retryable: ErrorKind::default_retryable().into_iter().collect(),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(cfg: &RetryConfig) -> Result<Self, EngineError> {
        if cfg.max_attempts == 0 {
            return Err(EngineError::InvalidPolicy(
                "max_attempts must be at least 1".into(),
            ));
        }
        if !cfg.backoff_multiplier.is_finite() || cfg.backoff_multiplier < 1.0 {
            return Err(EngineError::InvalidPolicy(format!(
                "backoff_multiplier must be >= 1.0, got {}",
                cfg.backoff_multiplier
            )));
        }
        if cfg.max_backoff_ms < cfg.backoff_base_ms {
            return Err(EngineError::InvalidPolicy(format!(
                "max_backoff_ms ({}) is below backoff_base_ms ({})",
                cfg.max_backoff_ms, cfg.backoff_base_ms
            )));
        }

        let mut retryable = BTreeSet::new();
        for kind in &cfg.retryable_error_kinds {
            if kind.is_always_fatal() {
                tracing::warn!(error_kind = %kind, "ignoring retryable error kind: always fatal");
                continue;
            }
            retryable.insert(*kind);
        }

        Ok(Self {
            max_attempts: cfg.max_attempts,
            backoff_base: Duration::from_millis(cfg.backoff_base_ms),
            backoff_multiplier: cfg.backoff_multiplier,
            max_backoff: Duration::from_millis(cfg.max_backoff_ms),
            retryable,
        })
    }

    /// A policy that never retries.
    pub fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn is_retryable(&self, kind: ErrorKind) -> bool {
        !kind.is_always_fatal() && self.retryable.contains(&kind)
    }

    /// `backoff_base * backoff_multiplier^(attempt - 1)`, capped at `max_backoff`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(63) as i32;
        let ms = self.backoff_base.as_millis() as f64 * self.backoff_multiplier.powi(exp);
        let cap = self.max_backoff.as_millis() as f64;
        Duration::from_millis(ms.min(cap) as u64)
    }
}

impl RetryStrategy for RetryPolicy {
    fn name(&self) -> &str {
        "exponential-backoff"
    }

    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        Some(self.backoff_for(attempt))
    }

    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn should_retry(&self, kind: ErrorKind) -> bool {
        self.is_retryable(kind)
    }
}
