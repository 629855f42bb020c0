#[allow(clippy::module_inception)]
pub mod error;
pub mod kind;

pub use error::{CliError, EngineError};
pub use kind::ErrorKind;
