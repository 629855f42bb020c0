use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Shared failure taxonomy. Adapters map tool-specific output onto these
/// variants so retry decisions stay language-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NetworkError,
    PermissionDenied,
    Timeout,
    DependencyConflict,
    ToolchainMissing,
    Unknown,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 6] = [
        ErrorKind::NetworkError,
        ErrorKind::PermissionDenied,
        ErrorKind::Timeout,
        ErrorKind::DependencyConflict,
        ErrorKind::ToolchainMissing,
        ErrorKind::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NetworkError => "network_error",
            Self::PermissionDenied => "permission_denied",
            Self::Timeout => "timeout",
            Self::DependencyConflict => "dependency_conflict",
            Self::ToolchainMissing => "toolchain_missing",
            Self::Unknown => "unknown",
        }
    }

    /// Kinds that no amount of retrying can change.
    pub fn is_always_fatal(self) -> bool {
        matches!(self, Self::PermissionDenied | Self::ToolchainMissing)
    }

    pub fn default_retryable() -> Vec<ErrorKind> {
        vec![ErrorKind::NetworkError, ErrorKind::Timeout]
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        ErrorKind::ALL
            .into_iter()
            .find(|k| k.as_str() == normalized)
            .ok_or_else(|| format!("unknown error kind: {s}"))
    }
}
