//! Error types for core value parsing.

use thiserror::Error;

/// Errors produced when parsing core types from strings.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The script identifier was not a valid UUID.
    #[error("invalid script id: {0}")]
    InvalidScriptId(String),

    /// The `run-at` value was not recognised.
    #[error("unknown run-at value: {0}")]
    UnknownRunAt(String),
}

/// Result type for core parsing operations.
pub type CoreResult<T> = Result<T, CoreError>;
