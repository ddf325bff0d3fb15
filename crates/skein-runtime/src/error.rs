//! Runtime error types.

use skein_core::ScriptId;
use thiserror::Error;

/// Errors that can occur in the runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// No script with this ID is installed.
    #[error("Script not installed: {0}")]
    NotInstalled(ScriptId),

    /// The script is installed but disabled.
    #[error("Script disabled: {0}")]
    Disabled(ScriptId),

    /// Capability error.
    #[error("Capability error: {0}")]
    Capability(#[from] skein_capabilities::CapabilityError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
