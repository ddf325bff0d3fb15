//! The unit of delivery.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A payload tagged with its stream and per-stream sequence number.
///
/// Sequence numbers start at zero and keep counting across the
/// buffering/bound boundary, so a receiver can verify ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Stream key.
    pub stream: String,
    /// Position within the stream.
    pub seq: u64,
    /// Opaque payload.
    pub payload: Value,
}

impl Envelope {
    /// Create an envelope.
    #[must_use]
    pub fn new(stream: impl Into<String>, seq: u64, payload: Value) -> Self {
        Self {
            stream: stream.into(),
            seq,
            payload,
        }
    }
}
