use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Jsonl,
    Progress,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Jsonl => "jsonl",
            Self::Progress => "progress",
        }
    }
}

/// Orchestrates per-language dependency installs from a scan/analysis document.
#[derive(Parser, Debug)]
#[command(name = "envsetup", version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to ~/.envsetup/config.toml, then ./envsetup.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute the plan and print the run report as JSON.
    Run(RunArgs),
    /// Print the ordered plan without executing anything.
    Plan(PlanArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// Scan/analysis JSON document, or `-` for stdin.
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Skip remaining items after the first exhausted failure.
    #[arg(long)]
    pub fail_fast: bool,

    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Per-command wall-clock timeout.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Comma-separated language order, e.g. `java,python,node`.
    #[arg(long)]
    pub priority: Option<String>,

    #[arg(long)]
    pub no_verify: bool,

    /// Write the report here instead of stdout.
    #[arg(long)]
    pub report_out: Option<PathBuf>,

    /// Also write the full ledger snapshot (attempts, errors, events).
    #[arg(long)]
    pub ledger_out: Option<PathBuf>,

    /// No progress output, only the final report.
    #[arg(long)]
    pub quiet: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PlanArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long)]
    pub priority: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_with_overrides() {
        let args = Args::try_parse_from([
            "envsetup",
            "run",
            "--input",
            "scan.json",
            "--format",
            "jsonl",
            "--fail-fast",
            "--max-attempts",
            "5",
            "--priority",
            "node,java",
        ])
        .unwrap();

        let Commands::Run(run) = args.command else {
            panic!("expected run");
        };
        assert_eq!(run.format, OutputFormat::Jsonl);
        assert!(run.fail_fast);
        assert_eq!(run.max_attempts, Some(5));
        assert_eq!(run.priority.as_deref(), Some("node,java"));
        assert!(!run.no_verify);
    }

    #[test]
    fn config_is_global() {
        let args =
            Args::try_parse_from(["envsetup", "plan", "--input", "scan.json", "--config", "x.toml"])
                .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("x.toml")));
        assert!(matches!(args.command, Commands::Plan(_)));
    }

    #[test]
    fn input_is_required() {
        assert!(Args::try_parse_from(["envsetup", "run"]).is_err());
    }
}
