use std::io::Read;
use std::path::Path;

use envsetup_core::error::CliError;
use envsetup_core::plan::ScanInput;
use serde::Serialize;

pub fn read_scan_input(path: &Path) -> Result<ScanInput, CliError> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| CliError::Input(format!("read stdin failed: {e}")))?;
        buf
    } else {
        std::fs::read_to_string(path)
            .map_err(|e| CliError::Input(format!("read {} failed: {e}", path.display())))?
    };
    parse_scan_input(&raw)
}

pub fn parse_scan_input(raw: &str) -> Result<ScanInput, CliError> {
    serde_json::from_str(raw).map_err(|e| CliError::Input(format!("invalid scan input: {e}")))
}

/// Pretty JSON to a file, or stdout when `path` is `None`.
pub fn write_json<T: Serialize>(path: Option<&Path>, value: &T) -> Result<(), CliError> {
    let body = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => std::fs::write(path, body + "\n")?,
        None => println!("{body}"),
    }
    Ok(())
}
