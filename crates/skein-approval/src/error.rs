/// Errors raised while handling confirmation traffic.
///
/// Decisions themselves, including denial and timeout, never surface here.
#[derive(Debug, thiserror::Error)]
pub enum ApprovalError {
    /// A response payload could not be decoded.
    #[error("malformed confirmation response: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    /// A request payload could not be decoded.
    #[error("malformed confirmation request: {0}")]
    MalformedRequest(#[source] serde_json::Error),

    /// A request could not be encoded for the wire.
    #[error("failed to encode confirmation request: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Result type for approval operations.
pub type ApprovalResult<T> = Result<T, ApprovalError>;
