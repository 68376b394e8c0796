//! Error types for the command-line front end.

use fg_core::CoreError;
use fg_func::FuncError;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] CoreError),

    #[error("Graph error: {0}")]
    Func(#[from] FuncError),

    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),

    /// Evaluation ran but the requested node recorded an error.
    #[error("Node '{node}' failed: {message}")]
    Evaluation { node: String, message: String },
}
