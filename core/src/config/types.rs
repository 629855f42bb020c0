use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;
use crate::plan::Language;

pub const DEFAULT_TIMEOUT_SECS: u64 = 600;
pub const MAX_TIMEOUT_SECS: u64 = 60 * 60;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub verify: VerifyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory`.
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "envsetup_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Log file directory. Defaults to `~/.envsetup/logs`.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    false
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Execution order by language. Languages missing from the list run last.
    #[serde(default = "default_language_priority")]
    pub language_priority: Vec<Language>,

    #[serde(default = "default_timeout_secs")]
    pub per_command_timeout_secs: u64,

    #[serde(default = "default_continue_on_failure")]
    pub continue_on_failure: bool,

    /// Bytes of stdout/stderr kept per attempt.
    #[serde(default = "default_output_tail_bytes")]
    pub output_tail_bytes: usize,

    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_language_priority() -> Vec<Language> {
    vec![Language::Java, Language::Python, Language::Node]
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_continue_on_failure() -> bool {
    true
}

fn default_output_tail_bytes() -> usize {
    4096
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            language_priority: default_language_priority(),
            per_command_timeout_secs: default_timeout_secs(),
            continue_on_failure: default_continue_on_failure(),
            output_tail_bytes: default_output_tail_bytes(),
            retry: RetryConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.per_command_timeout_secs.clamp(1, MAX_TIMEOUT_SECS))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_retry_strategy")]
    pub strategy: String,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    #[serde(default = "ErrorKind::default_retryable")]
    pub retryable_error_kinds: Vec<ErrorKind>,
}

fn default_retry_strategy() -> String {
    "exponential-backoff".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            strategy: default_retry_strategy(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            max_backoff_ms: default_max_backoff_ms(),
            retryable_error_kinds: ErrorKind::default_retryable(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyConfig {
    #[serde(default = "default_verify_enabled")]
    pub enabled: bool,
    #[serde(default = "default_verify_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_verify_enabled() -> bool {
    true
}

fn default_verify_timeout_secs() -> u64 {
    60
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            enabled: default_verify_enabled(),
            timeout_secs: default_verify_timeout_secs(),
        }
    }
}

impl VerifyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.clamp(1, MAX_TIMEOUT_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(
            cfg.engine.language_priority,
            vec![Language::Java, Language::Python, Language::Node]
        );
        assert!(cfg.engine.continue_on_failure);
        assert_eq!(cfg.engine.retry.max_attempts, 3);
        assert_eq!(
            cfg.engine.retry.retryable_error_kinds,
            vec![ErrorKind::NetworkError, ErrorKind::Timeout]
        );
        assert!(cfg.verify.enabled);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [engine]
            language_priority = ["node", "java"]
            continue_on_failure = false

            [engine.retry]
            max_attempts = 5
            retryable_error_kinds = ["network_error", "dependency_conflict"]
            "#,
        )
        .unwrap();

        assert_eq!(cfg.engine.language_priority, vec![Language::Node, Language::Java]);
        assert!(!cfg.engine.continue_on_failure);
        assert_eq!(cfg.engine.retry.max_attempts, 5);
        assert_eq!(cfg.engine.retry.backoff_base_ms, 1000);
        assert_eq!(cfg.engine.per_command_timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn timeout_is_clamped() {
        let mut engine = EngineConfig::default();
        engine.per_command_timeout_secs = 0;
        assert_eq!(engine.command_timeout(), Duration::from_secs(1));
        engine.per_command_timeout_secs = MAX_TIMEOUT_SECS + 10;
        assert_eq!(engine.command_timeout(), Duration::from_secs(MAX_TIMEOUT_SECS));
    }
}
