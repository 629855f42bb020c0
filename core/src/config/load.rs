use std::path::{Path, PathBuf};

use super::types::AppConfig;
use crate::plan::Language;

/// Get the default data directory: ~/.envsetup
pub fn get_envsetup_data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".envsetup"))
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("read {} failed: {e}", path.display()))?;
    let mut cfg = toml::from_str::<AppConfig>(&s)?;
    apply_env_overrides(&mut cfg)?;
    expand_log_dir(&mut cfg);
    Ok(cfg)
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    let data_dir = match get_envsetup_data_dir() {
        Ok(dir) => Some(dir),
        Err(e) => {
            tracing::debug!(error = %e, "no user config directory");
            None
        }
    };
    load_layered(data_dir.as_deref(), Path::new("envsetup.toml"))
}

/// `<data_dir>/config.toml` first, then `local_config`, then defaults.
fn load_layered(data_dir: Option<&Path>, local_config: &Path) -> anyhow::Result<AppConfig> {
    let user_config = data_dir
        .map(|d| d.join("config.toml"))
        .filter(|p| p.exists());

    let mut cfg: AppConfig = if let Some(path) = user_config {
        let s = std::fs::read_to_string(&path)?;
        toml::from_str::<AppConfig>(&s)?
    } else if local_config.exists() {
        let s = std::fs::read_to_string(local_config)?;
        toml::from_str::<AppConfig>(&s)?
    } else {
        AppConfig::default()
    };

    if let Some(data_dir) = data_dir {
        if cfg.logging.file
            && cfg
                .logging
                .directory
                .as_ref()
                .map(|s| s.trim().is_empty())
                .unwrap_or(true)
        {
            cfg.logging.directory = Some(data_dir.join("logs").to_string_lossy().to_string());
        }
    }

    apply_env_overrides(&mut cfg)?;
    expand_log_dir(&mut cfg);
    Ok(cfg)
}

/// Environment variable overrides (highest priority).
pub fn apply_env_overrides(cfg: &mut AppConfig) -> anyhow::Result<()> {
    if let Some(v) = non_empty_var("ENVSETUP_MAX_ATTEMPTS") {
        cfg.engine.retry.max_attempts = v
            .parse()
            .map_err(|_| anyhow::anyhow!("ENVSETUP_MAX_ATTEMPTS is not a number: {v}"))?;
    }
    if let Some(v) = non_empty_var("ENVSETUP_COMMAND_TIMEOUT_SECS") {
        cfg.engine.per_command_timeout_secs = v
            .parse()
            .map_err(|_| anyhow::anyhow!("ENVSETUP_COMMAND_TIMEOUT_SECS is not a number: {v}"))?;
    }
    if let Some(v) = non_empty_var("ENVSETUP_CONTINUE_ON_FAILURE") {
        cfg.engine.continue_on_failure = parse_bool(&v)
            .ok_or_else(|| anyhow::anyhow!("ENVSETUP_CONTINUE_ON_FAILURE is not a bool: {v}"))?;
    }
    if let Some(v) = non_empty_var("ENVSETUP_LANGUAGE_PRIORITY") {
        cfg.engine.language_priority = parse_language_list(&v).map_err(anyhow::Error::msg)?;
    }
    if let Some(v) = non_empty_var("ENVSETUP_LOG_LEVEL") {
        cfg.logging.level = v;
    }
    Ok(())
}

/// Parse `"java, python,node"` into an ordered language list.
pub fn parse_language_list(raw: &str) -> Result<Vec<Language>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<Language>)
        .collect()
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn expand_log_dir(cfg: &mut AppConfig) {
    if let Some(dir) = cfg.logging.directory.as_mut() {
        *dir = shellexpand::tilde(dir.as_str()).into_owned();
    }
}
