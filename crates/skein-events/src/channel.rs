//! Per-stream buffering and flush.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::envelope::Envelope;
use crate::error::{ChannelError, ChannelResult};
use crate::transport::Transport;

/// Default buffered-message count between warnings.
pub const DEFAULT_BUFFER_WARN_THRESHOLD: usize = 1024;

/// Lifecycle of one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamState {
    /// No transport yet; messages are queued.
    Buffering,
    /// Messages go straight to the transport.
    Bound,
    /// Torn down; messages are discarded.
    Closed,
}

struct Stream {
    state: StreamState,
    buffer: Vec<Envelope>,
    transport: Option<Arc<dyn Transport>>,
    next_seq: u64,
}

impl Stream {
    fn new() -> Self {
        Self {
            state: StreamState::Buffering,
            buffer: Vec::new(),
            transport: None,
            next_seq: 0,
        }
    }

    fn envelope(&mut self, key: &str, payload: Value) -> Envelope {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        Envelope::new(key, seq, payload)
    }
}

/// A set of logical streams that buffer until bound.
///
/// Each stream moves `Buffering -> Bound` exactly once. The move takes the
/// buffer, replays it through the transport in send order, and only then
/// releases the stream lock, so a `dispatch` racing with `bind` is always
/// delivered after the replayed messages.
pub struct DeliveryChannel {
    streams: Mutex<HashMap<String, Stream>>,
    default_transport: Option<Arc<dyn Transport>>,
    buffer_warn_threshold: usize,
    failed_sends: AtomicU64,
}

impl DeliveryChannel {
    /// Create a channel whose `bind` uses `transport`.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::build(Some(transport))
    }

    /// Create a channel with no default transport; only `bind_to` can bind.
    #[must_use]
    pub fn unbound() -> Self {
        Self::build(None)
    }

    fn build(default_transport: Option<Arc<dyn Transport>>) -> Self {
        Self {
            streams: Mutex::new(HashMap::new()),
            default_transport,
            buffer_warn_threshold: DEFAULT_BUFFER_WARN_THRESHOLD,
            failed_sends: AtomicU64::new(0),
        }
    }

    /// Warn every time a buffering stream grows by `threshold` messages.
    ///
    /// Zero disables the warning.
    #[must_use]
    pub fn with_buffer_warn_threshold(mut self, threshold: usize) -> Self {
        self.buffer_warn_threshold = threshold;
        self
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Stream>> {
        self.streams.lock().unwrap_or_else(|e| {
            warn!("channel lock poisoned, recovering");
            e.into_inner()
        })
    }

    /// Send `payload` on `stream`, or queue it until the stream is bound.
    ///
    /// Never blocks and never fails. Transport errors are logged and counted
    /// in [`failed_sends`](Self::failed_sends).
    pub fn dispatch(&self, stream: &str, payload: Value) {
        let mut streams = self.lock();
        let entry = streams
            .entry(stream.to_owned())
            .or_insert_with(Stream::new);

        match entry.state {
            StreamState::Buffering => {
                let env = entry.envelope(stream, payload);
                entry.buffer.push(env);
                let pending = entry.buffer.len();
                trace!(stream, pending, "buffered message");
                let threshold = self.buffer_warn_threshold;
                if threshold > 0 && pending.is_multiple_of(threshold) {
                    warn!(stream, pending, "stream is still unbound, buffer growing");
                }
            },
            StreamState::Bound => {
                let env = entry.envelope(stream, payload);
                if let Some(transport) = entry.transport.as_ref() {
                    self.send(transport.as_ref(), env);
                }
            },
            StreamState::Closed => {
                debug!(stream, "dropping message for closed stream");
            },
        }
    }

    /// Bind `stream` to the default transport and flush its buffer.
    ///
    /// Returns how many buffered messages were replayed. Binding an already
    /// bound stream is a no-op that returns zero.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::NoTransport`] if the channel was created
    /// without a default transport, or [`ChannelError::Closed`] if the
    /// stream was torn down.
    pub fn bind(&self, stream: &str) -> ChannelResult<usize> {
        let transport = self
            .default_transport
            .clone()
            .ok_or_else(|| ChannelError::NoTransport {
                stream: stream.to_owned(),
            })?;
        self.bind_to(stream, transport)
    }

    /// Bind `stream` to a specific destination and flush its buffer.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Closed`] if the stream was torn down.
    pub fn bind_to(&self, stream: &str, transport: Arc<dyn Transport>) -> ChannelResult<usize> {
        let mut streams = self.lock();
        let entry = streams
            .entry(stream.to_owned())
            .or_insert_with(Stream::new);

        match entry.state {
            StreamState::Bound => {
                trace!(stream, "stream already bound");
                return Ok(0);
            },
            StreamState::Closed => {
                return Err(ChannelError::Closed {
                    stream: stream.to_owned(),
                });
            },
            StreamState::Buffering => {},
        }

        let buffered = std::mem::take(&mut entry.buffer);
        entry.state = StreamState::Bound;
        let replayed = buffered.len();
        for env in buffered {
            self.send(transport.as_ref(), env);
        }
        entry.transport = Some(transport);

        debug!(stream, replayed, "stream bound");
        Ok(replayed)
    }

    fn send(&self, transport: &dyn Transport, envelope: Envelope) {
        let seq = envelope.seq;
        if let Err(e) = transport.send(envelope) {
            self.failed_sends.fetch_add(1, Ordering::Relaxed);
            warn!(seq, error = %e, "transport send failed");
        }
    }

    /// Current state of `stream`. Unknown streams are buffering.
    #[must_use]
    pub fn state(&self, stream: &str) -> StreamState {
        self.lock()
            .get(stream)
            .map_or(StreamState::Buffering, |s| s.state)
    }

    /// Number of messages waiting for `bind`.
    #[must_use]
    pub fn pending(&self, stream: &str) -> usize {
        self.lock().get(stream).map_or(0, |s| s.buffer.len())
    }

    /// Tear down `stream`, discarding anything still buffered.
    ///
    /// Returns the number of discarded messages.
    pub fn close(&self, stream: &str) -> usize {
        let mut streams = self.lock();
        let entry = streams
            .entry(stream.to_owned())
            .or_insert_with(Stream::new);
        let dropped = entry.buffer.len();
        entry.buffer.clear();
        entry.transport = None;
        entry.state = StreamState::Closed;
        if dropped > 0 {
            warn!(stream, dropped, "closed stream with undelivered messages");
        } else {
            debug!(stream, "stream closed");
        }
        dropped
    }

    /// Known stream keys, sorted.
    #[must_use]
    pub fn streams(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    /// Total number of transport sends that failed.
    #[must_use]
    pub fn failed_sends(&self) -> u64 {
        self.failed_sends.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for DeliveryChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliveryChannel")
            .field("streams", &self.lock().len())
            .field("has_default_transport", &self.default_transport.is_some())
            .field("buffer_warn_threshold", &self.buffer_warn_threshold)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
