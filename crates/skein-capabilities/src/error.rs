//! Capability invocation errors.
//!
//! Resolution itself never fails; these errors surface only when a
//! capability is invoked.

use thiserror::Error;

/// Errors that can occur when invoking a capability.
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// The script did not declare the grant.
    #[error("capability not granted: {grant}")]
    NotGranted {
        /// The grant that was looked up.
        grant: String,
    },

    /// The binding is a value, not something that can be called.
    #[error("capability is not callable: {grant}")]
    NotCallable {
        /// The grant that was invoked.
        grant: String,
    },

    /// The user (or a cached decision) refused the call.
    #[error("capability denied: {grant} on {resource}")]
    Denied {
        /// The grant that was invoked.
        grant: String,
        /// The resource the call targeted.
        resource: String,
    },

    /// The arguments did not fit the capability.
    #[error("invalid arguments for {grant}: {reason}")]
    InvalidArguments {
        /// The grant that was invoked.
        grant: String,
        /// What was wrong.
        reason: String,
    },

    /// The capability ran and failed.
    #[error("capability failed: {0}")]
    Failed(String),
}

/// Result type for capability invocation.
pub type CapabilityResult<T> = Result<T, CapabilityError>;
