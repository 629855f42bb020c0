use lazy_static::lazy_static;
use regex::Regex;

use super::types::CommandOutput;
use crate::error::ErrorKind;

lazy_static! {
    static ref MISSING_RE: Regex = Regex::new(
        r"(?im)(command not found|is not recognized as an internal or external command|: not found$|no java runtime present|unable to locate a java runtime)"
    )
    .expect("static regex");
    static ref PERMISSION_RE: Regex = Regex::new(
        r"(?i)(permission denied|\beacces\b|\beperm\b|access is denied|operation not permitted)"
    )
    .expect("static regex");
    static ref NETWORK_RE: Regex = Regex::new(
        r"(?i)(\betimedout\b|\beconnreset\b|\beconnrefused\b|\benotfound\b|\beai_again\b|could not resolve host|connection refused|connection reset|temporary failure in name resolution|network is unreachable|read timed out|failed to establish a new connection|socket hang up)"
    )
    .expect("static regex");
    static ref CONFLICT_RE: Regex = Regex::new(
        r"(?i)(\beresolve\b|conflicting dependencies|resolutionimpossible|version conflict|dependency conflict|unable to resolve dependency tree)"
    )
    .expect("static regex");
}

/// Classify free-form tool output. `None` when nothing recognizable matched.
pub fn classify_text(text: &str) -> Option<ErrorKind> {
    if MISSING_RE.is_match(text) {
        Some(ErrorKind::ToolchainMissing)
    } else if PERMISSION_RE.is_match(text) {
        Some(ErrorKind::PermissionDenied)
    } else if NETWORK_RE.is_match(text) {
        Some(ErrorKind::NetworkError)
    } else if CONFLICT_RE.is_match(text) {
        Some(ErrorKind::DependencyConflict)
    } else {
        None
    }
}

/// Map a failed command onto the shared taxonomy.
///
/// Process-level facts win (timeout, spawn failure, shell exit codes), then
/// the ecosystem `hint`, then the generic text patterns.
pub fn classify_output<H>(output: &CommandOutput, hint: H) -> ErrorKind
where
    H: Fn(&str) -> Option<ErrorKind>,
{
    if output.timed_out {
        return ErrorKind::Timeout;
    }

    if let Some(spawn) = &output.spawn_error {
        return match spawn.kind {
            std::io::ErrorKind::NotFound => ErrorKind::ToolchainMissing,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            _ => ErrorKind::Unknown,
        };
    }

    match output.exit_code {
        // sh: command not found / cmd.exe: not recognized
        Some(127) | Some(9009) => return ErrorKind::ToolchainMissing,
        // sh: found but not executable
        Some(126) => return ErrorKind::PermissionDenied,
        _ => {}
    }

    let text = format!("{}\n{}", output.stderr_tail, output.stdout_tail);
    hint(&text)
        .or_else(|| classify_text(&text))
        .unwrap_or(ErrorKind::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::types::SpawnFailure;

    fn no_hint(_: &str) -> Option<ErrorKind> {
        None
    }

    #[test]
    fn timeout_wins_over_text() {
        let mut out = CommandOutput::exited(1, "", "permission denied");
        out.timed_out = true;
        assert_eq!(classify_output(&out, no_hint), ErrorKind::Timeout);
    }

    #[test]
    fn spawn_not_found_is_missing_toolchain() {
        let out = CommandOutput {
            spawn_error: Some(SpawnFailure {
                kind: std::io::ErrorKind::NotFound,
                message: "No such file or directory".into(),
            }),
            ..CommandOutput::default()
        };
        assert_eq!(classify_output(&out, no_hint), ErrorKind::ToolchainMissing);
    }

    #[test]
    fn shell_exit_codes() {
        let missing = CommandOutput::exited(127, "", "sh: 1: mvn: not found");
        assert_eq!(classify_output(&missing, no_hint), ErrorKind::ToolchainMissing);
        let not_exec = CommandOutput::exited(126, "", "");
        assert_eq!(classify_output(&not_exec, no_hint), ErrorKind::PermissionDenied);
    }

    #[test]
    fn text_patterns() {
        let cases = [
            ("npm ERR! code EACCES", ErrorKind::PermissionDenied),
            ("getaddrinfo ENOTFOUND registry.npmjs.org", ErrorKind::NetworkError),
            ("Could not resolve host: github.com", ErrorKind::NetworkError),
            ("npm ERR! code ERESOLVE", ErrorKind::DependencyConflict),
            ("'yarn' is not recognized as an internal or external command", ErrorKind::ToolchainMissing),
        ];
        for (text, want) in cases {
            let out = CommandOutput::exited(1, "", text);
            assert_eq!(classify_output(&out, no_hint), want, "{text}");
        }
    }

    #[test]
    fn hint_runs_before_generic_patterns() {
        let out = CommandOutput::exited(1, "", "Could not transfer artifact: Connection refused");
        let kind = classify_output(&out, |_| Some(ErrorKind::DependencyConflict));
        assert_eq!(kind, ErrorKind::DependencyConflict);
    }

    #[test]
    fn unrecognized_failure_is_unknown() {
        let out = CommandOutput::exited(2, "", "something odd happened");
        assert_eq!(classify_output(&out, no_hint), ErrorKind::Unknown);
    }
}
