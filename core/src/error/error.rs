use thiserror::Error;

use crate::plan::Language;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("config error: {0}")]
    Config(String),
    #[error("input error: {0}")]
    Input(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Configuration faults. Execution faults never surface here; they are
/// recorded as [`crate::ErrorKind`] on attempts instead.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("plan item for {0} has no commands")]
    EmptyCommands(Language),

    #[error("plan item for {language} has a blank command at position {index}")]
    BlankCommand { language: Language, index: usize },

    #[error("duplicate plan item for language {0}")]
    DuplicateLanguage(Language),

    #[error("working directory for {language} escapes the project root: {path}")]
    WorkingDirectoryEscape { language: Language, path: String },

    #[error("no executor registered for {0}")]
    MissingExecutor(Language),

    #[error("invalid retry policy: {0}")]
    InvalidPolicy(String),

    #[error("ledger invariant violated: {0}")]
    Ledger(String),

    #[error("config error: {0}")]
    Config(String),
}

impl EngineError {
    /// Process exit code used by the command line front end.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::InvalidPolicy(_) => 11,
            Self::EmptyCommands(_)
            | Self::BlankCommand { .. }
            | Self::DuplicateLanguage(_)
            | Self::WorkingDirectoryEscape { .. } => 12,
            Self::MissingExecutor(_) | Self::Ledger(_) => 50,
        }
    }
}
