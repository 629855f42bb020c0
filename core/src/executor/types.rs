use std::time::Duration;

use crate::error::ErrorKind;
use crate::ledger::Ledger;

/// Per-command resource bounds.
#[derive(Debug, Clone, Copy)]
pub struct CommandLimits {
    /// Hard wall-clock timeout; the subprocess is killed when it expires.
    pub timeout: Duration,
    /// Bytes of stdout/stderr retained.
    pub tail_bytes: usize,
}

impl Default for CommandLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(crate::config::DEFAULT_TIMEOUT_SECS),
            tail_bytes: 4096,
        }
    }
}

/// What an adapter gets for one attempt.
#[derive(Clone, Copy)]
pub struct ExecContext<'a> {
    pub limits: CommandLimits,
    pub attempt_number: u32,
    pub ledger: &'a Ledger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnFailure {
    pub kind: std::io::ErrorKind,
    pub message: String,
}

/// Raw result of a single command line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout_tail: String,
    pub stderr_tail: String,
    pub timed_out: bool,
    pub spawn_error: Option<SpawnFailure>,
    pub duration_ms: u64,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.spawn_error.is_none() && self.exit_code == Some(0)
    }

    pub fn exited(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(code),
            stdout_tail: stdout.into(),
            stderr_tail: stderr.into(),
            ..Self::default()
        }
    }

    pub fn timed_out(after: Duration) -> Self {
        Self {
            timed_out: true,
            stderr_tail: format!("timed out after {}s", after.as_secs()),
            duration_ms: after.as_millis() as u64,
            ..Self::default()
        }
    }

    pub fn spawn_failed(err: &std::io::Error) -> Self {
        Self {
            stderr_tail: err.to_string(),
            spawn_error: Some(SpawnFailure {
                kind: err.kind(),
                message: err.to_string(),
            }),
            ..Self::default()
        }
    }
}

/// Result of one attempt of a whole plan item.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionOutcome {
    pub exit_status: Option<i32>,
    pub stdout_tail: String,
    pub stderr_tail: String,
    pub error_kind: Option<ErrorKind>,
    /// The command that stopped the sequence.
    pub failed_command: Option<String>,
}

impl ExecutionOutcome {
    pub fn success(stdout_tail: impl Into<String>, stderr_tail: impl Into<String>) -> Self {
        Self {
            exit_status: Some(0),
            stdout_tail: stdout_tail.into(),
            stderr_tail: stderr_tail.into(),
            error_kind: None,
            failed_command: None,
        }
    }

    pub fn failure(kind: ErrorKind, exit_status: Option<i32>, stderr_tail: impl Into<String>) -> Self {
        Self {
            exit_status,
            stdout_tail: String::new(),
            stderr_tail: stderr_tail.into(),
            error_kind: Some(kind),
            failed_command: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error_kind.is_none() && self.exit_status == Some(0)
    }
}
