//! Error types for message delivery.

use thiserror::Error;

/// Errors raised by transports and by misuse of a [`DeliveryChannel`](crate::DeliveryChannel).
///
/// Plain `dispatch` never returns one of these; send failures are logged
/// and counted instead.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// `bind` was called on a channel that has no default transport.
    #[error("no transport available to bind stream {stream}")]
    NoTransport {
        /// The stream key.
        stream: String,
    },

    /// The stream was torn down.
    #[error("stream {stream} is closed")]
    Closed {
        /// The stream key.
        stream: String,
    },

    /// The receiving side is gone.
    #[error("receiver for stream {stream} disconnected")]
    Disconnected {
        /// The stream key.
        stream: String,
    },

    /// Transport-specific failure.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Result type for channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;
