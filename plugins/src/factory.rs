use std::sync::Arc;

use envsetup_core::config::RetryConfig;
use envsetup_core::executor::{CommandRunner, ExecutorRegistry, ShellCommandRunner};
use envsetup_core::observe::RunObserver;
use envsetup_core::retry::{RetryPolicy, RetryStrategy};
use envsetup_core::EngineError;

use crate::executor::{
    JavaExecutor, JsonlRendererPlugin, LinearRetryPlugin, NodeExecutor, ProgressRendererPlugin,
    PythonExecutor, TextRendererPlugin,
};

/// Registry with every supported ecosystem, all sharing one runner.
pub fn build_resolver_with_runner(runner: Arc<dyn CommandRunner>) -> ExecutorRegistry {
    ExecutorRegistry::new()
        .register(Arc::new(JavaExecutor::with_runner(runner.clone())))
        .register(Arc::new(PythonExecutor::with_runner(runner.clone())))
        .register(Arc::new(NodeExecutor::with_runner(runner)))
}

pub fn build_resolver() -> ExecutorRegistry {
    build_resolver_with_runner(Arc::new(ShellCommandRunner))
}

pub fn build_retry_strategy(cfg: &RetryConfig) -> Result<Arc<dyn RetryStrategy>, EngineError> {
    let policy = RetryPolicy::from_config(cfg)?;
    match cfg.strategy.as_str() {
        "exponential-backoff" | "exponential" => {
            tracing::debug!(max_attempts = policy.max_attempts, "using exponential backoff");
            Ok(Arc::new(policy))
        }
        "linear" => {
            tracing::debug!(max_attempts = policy.max_attempts, "using linear backoff");
            Ok(Arc::new(LinearRetryPlugin::new(policy)))
        }
        other => Err(EngineError::InvalidPolicy(format!(
            "unknown retry strategy: {other}"
        ))),
    }
}

/// `None` for formats that render nothing.
pub fn build_renderer(format: &str, interactive: bool) -> Option<Arc<dyn RunObserver>> {
    match format {
        "jsonl" => Some(Arc::new(JsonlRendererPlugin::new(false))),
        "progress" => Some(Arc::new(ProgressRendererPlugin::new(interactive))),
        "text" => Some(Arc::new(TextRendererPlugin::new(!interactive))),
        other => {
            tracing::debug!(format = other, "no renderer for output format");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use envsetup_core::executor::ExecutorResolver;
    use envsetup_core::plan::Language;

    use super::*;

    #[test]
    fn resolver_covers_every_language() {
        let registry = build_resolver();
        for language in Language::ALL {
            let executor = registry.resolve(language).unwrap();
            assert_eq!(executor.language(), language);
        }
    }

    #[test]
    fn strategy_is_chosen_by_name() {
        let cfg = RetryConfig {
            strategy: "linear".into(),
            ..RetryConfig::default()
        };
        let strategy = build_retry_strategy(&cfg).unwrap();
        assert_eq!(strategy.name(), "linear");
        assert_eq!(strategy.next_delay(2), Some(Duration::from_millis(2000)));

        let default = build_retry_strategy(&RetryConfig::default()).unwrap();
        assert_eq!(default.name(), "exponential-backoff");
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let cfg = RetryConfig {
            strategy: "fibonacci".into(),
            ..RetryConfig::default()
        };
        assert!(matches!(
            build_retry_strategy(&cfg),
            Err(EngineError::InvalidPolicy(_))
        ));
    }

    #[test]
    fn renderer_by_format() {
        assert_eq!(build_renderer("jsonl", false).unwrap().format(), "jsonl");
        assert_eq!(build_renderer("text", true).unwrap().format(), "text");
        assert!(build_renderer("none", true).is_none());
    }
}
