use std::time::Duration;

use envsetup_core::retry::{RetryPolicy, RetryStrategy};
use envsetup_core::ErrorKind;

/// `backoff_base * attempt`, capped at `max_backoff`. Retryable and fatal
/// kinds follow the wrapped policy.
pub struct LinearRetryPlugin {
    policy: RetryPolicy,
}

impl LinearRetryPlugin {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }
}

impl RetryStrategy for LinearRetryPlugin {
    fn name(&self) -> &str {
        "linear"
    }

    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.policy.max_attempts {
            return None;
        }
        let delay = self.policy.backoff_base.saturating_mul(attempt.max(1));
        Some(delay.min(self.policy.max_backoff))
    }

    fn max_attempts(&self) -> u32 {
        self.policy.max_attempts
    }

    fn should_retry(&self, kind: ErrorKind) -> bool {
        self.policy.is_retryable(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_backoff() {
        let plugin = LinearRetryPlugin::new(RetryPolicy {
            max_attempts: 4,
            backoff_base: Duration::from_millis(50),
            max_backoff: Duration::from_millis(120),
            ..RetryPolicy::default()
        });
        assert_eq!(plugin.next_delay(1), Some(Duration::from_millis(50)));
        assert_eq!(plugin.next_delay(2), Some(Duration::from_millis(100)));
        assert_eq!(plugin.next_delay(3), Some(Duration::from_millis(120)));
        assert_eq!(plugin.next_delay(4), None);
    }

    #[test]
    fn test_linear_keeps_fatal_kinds() {
        let plugin = LinearRetryPlugin::new(RetryPolicy::default());
        assert!(plugin.should_retry(ErrorKind::Timeout));
        assert!(!plugin.should_retry(ErrorKind::ToolchainMissing));
    }
}
