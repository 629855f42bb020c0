use envsetup_core::config::{parse_language_list, AppConfig};
use envsetup_core::error::CliError;
use envsetup_core::planner::{build_plan, LanguagePriority};

use super::cli::PlanArgs;
use super::input::{read_scan_input, write_json};

pub fn plan(args: PlanArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let order = match args.priority.as_deref() {
        Some(raw) => parse_language_list(raw).map_err(CliError::Config)?,
        None => cfg.engine.language_priority.clone(),
    };
    let input = read_scan_input(&args.input)?;
    let items = build_plan(
        &input.detections,
        &input.analysis,
        input.project_path.as_deref(),
        &LanguagePriority::new(order),
    )?;
    write_json(None, &items)?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_file(dir: &std::path::Path, body: &str) -> std::path::PathBuf {
        let path = dir.join("scan.json");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn prints_plan_for_valid_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = scan_file(
            dir.path(),
            r#"{ "detections": [{ "language": "node" }],
                 "analysis": { "items": [
                   { "language": "node", "working_directory": ".", "ordered_commands": ["npm ci"] }
                 ] } }"#,
        );
        let args = PlanArgs {
            input,
            priority: Some("node".into()),
        };
        assert_eq!(plan(args, &AppConfig::default()).unwrap(), 0);
    }

    #[test]
    fn empty_command_list_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = scan_file(
            dir.path(),
            r#"{ "detections": [{ "language": "java" }],
                 "analysis": { "items": [
                   { "language": "java", "working_directory": ".", "ordered_commands": [] }
                 ] } }"#,
        );
        let args = PlanArgs {
            input,
            priority: None,
        };
        let err = plan(args, &AppConfig::default()).unwrap_err();
        assert!(matches!(err, CliError::Engine(_)));
    }

    #[test]
    fn unknown_priority_language_is_a_config_error() {
        let args = PlanArgs {
            input: "missing.json".into(),
            priority: Some("cobol".into()),
        };
        assert!(matches!(
            plan(args, &AppConfig::default()),
            Err(CliError::Config(_))
        ));
    }
}
