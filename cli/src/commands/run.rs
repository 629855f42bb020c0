use std::sync::Arc;

use envsetup_core::config::{parse_language_list, AppConfig};
use envsetup_core::error::CliError;
use envsetup_core::ledger::OverallStatus;
use envsetup_core::{Orchestrator, RunReport};
use envsetup_plugins::factory;
use tokio_util::sync::CancellationToken;

use super::cli::RunArgs;
use super::input::{read_scan_input, write_json};

pub const EXIT_PARTIAL_FAILURE: i32 = 2;
pub const EXIT_FAILED: i32 = 3;
pub const EXIT_CANCELLED: i32 = 130;

/// Fold command line flags into the loaded config.
pub fn apply_run_overrides(cfg: &mut AppConfig, args: &RunArgs) -> Result<(), CliError> {
    if args.fail_fast {
        cfg.engine.continue_on_failure = false;
    }
    if let Some(n) = args.max_attempts {
        cfg.engine.retry.max_attempts = n;
    }
    if let Some(secs) = args.timeout_secs {
        cfg.engine.per_command_timeout_secs = secs;
    }
    if let Some(raw) = args.priority.as_deref() {
        cfg.engine.language_priority = parse_language_list(raw).map_err(CliError::Config)?;
    }
    if args.no_verify {
        cfg.verify.enabled = false;
    }
    Ok(())
}

pub fn exit_code_for_report(report: &RunReport) -> i32 {
    if report.cancelled {
        return EXIT_CANCELLED;
    }
    match report.overall_status() {
        OverallStatus::Succeeded => 0,
        OverallStatus::PartialFailure => EXIT_PARTIAL_FAILURE,
        OverallStatus::Failed => EXIT_FAILED,
    }
}

pub async fn run(
    args: RunArgs,
    mut cfg: AppConfig,
    cancel: CancellationToken,
) -> Result<i32, CliError> {
    apply_run_overrides(&mut cfg, &args)?;
    let input = read_scan_input(&args.input)?;

    let strategy = factory::build_retry_strategy(&cfg.engine.retry)?;
    let mut builder = Orchestrator::builder()
        .engine_config(cfg.engine.clone())
        .verify_config(cfg.verify.clone())
        .resolver(Arc::new(factory::build_resolver()))
        .retry_strategy(strategy);
    if !args.quiet {
        let interactive = atty::is(atty::Stream::Stderr);
        if let Some(renderer) = factory::build_renderer(args.format.as_str(), interactive) {
            builder = builder.observer(renderer);
        }
    }
    let orchestrator = builder.build()?;

    let report = orchestrator.run_all(&input, cancel).await?;

    if let Some(path) = args.ledger_out.as_deref() {
        write_json(Some(path), &report.ledger)?;
    }
    write_json(args.report_out.as_deref(), &report)?;

    Ok(exit_code_for_report(&report))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use envsetup_core::plan::Language;

    use super::*;
    use crate::commands::cli::OutputFormat;

    fn args() -> RunArgs {
        RunArgs {
            input: PathBuf::from("scan.json"),
            format: OutputFormat::Text,
            fail_fast: false,
            max_attempts: None,
            timeout_secs: None,
            priority: None,
            no_verify: false,
            report_out: None,
            ledger_out: None,
            quiet: false,
        }
    }

    #[test]
    fn flags_override_config() {
        let mut cfg = AppConfig::default();
        let args = RunArgs {
            fail_fast: true,
            max_attempts: Some(1),
            timeout_secs: Some(30),
            priority: Some("node,python".into()),
            no_verify: true,
            ..args()
        };
        apply_run_overrides(&mut cfg, &args).unwrap();

        assert!(!cfg.engine.continue_on_failure);
        assert_eq!(cfg.engine.retry.max_attempts, 1);
        assert_eq!(cfg.engine.per_command_timeout_secs, 30);
        assert_eq!(cfg.engine.language_priority, vec![Language::Node, Language::Python]);
        assert!(!cfg.verify.enabled);
    }

    #[test]
    fn no_flags_keep_config() {
        let mut cfg = AppConfig::default();
        apply_run_overrides(&mut cfg, &args()).unwrap();
        assert!(cfg.engine.continue_on_failure);
        assert_eq!(cfg.engine.retry.max_attempts, 3);
        assert!(cfg.verify.enabled);
    }

    #[test]
    fn bad_priority_is_a_config_error() {
        let mut cfg = AppConfig::default();
        let args = RunArgs {
            priority: Some("java,fortran".into()),
            ..args()
        };
        assert!(matches!(
            apply_run_overrides(&mut cfg, &args),
            Err(CliError::Config(_))
        ));
    }
}
