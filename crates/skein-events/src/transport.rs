//! Transport abstraction and the in-process implementation.

use tokio::sync::mpsc;

use crate::envelope::Envelope;
use crate::error::{ChannelError, ChannelResult};

/// The primitive a host context boundary provides.
///
/// `send` must not block: it is called while the stream is locked so that
/// replay and direct sends cannot interleave.
pub trait Transport: Send + Sync {
    /// Hand one envelope to the other side.
    ///
    /// # Errors
    ///
    /// Returns an error if the other side cannot accept the envelope.
    fn send(&self, envelope: Envelope) -> ChannelResult<()>;
}

/// Connects two contexts in the same process.
#[derive(Debug, Clone)]
pub struct LocalTransport {
    sender: mpsc::UnboundedSender<Envelope>,
}

impl LocalTransport {
    /// Create a connected transport/receiver pair.
    #[must_use]
    pub fn pair() -> (Self, LocalReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, LocalReceiver { receiver })
    }

    /// Whether the receiving side has been dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl Transport for LocalTransport {
    fn send(&self, envelope: Envelope) -> ChannelResult<()> {
        self.sender
            .send(envelope)
            .map_err(|e| ChannelError::Disconnected {
                stream: e.0.stream,
            })
    }
}

/// Receiving end of a [`LocalTransport`].
#[derive(Debug)]
pub struct LocalReceiver {
    receiver: mpsc::UnboundedReceiver<Envelope>,
}

impl LocalReceiver {
    /// Wait for the next envelope.
    ///
    /// Returns `None` once every sender is gone and the queue is empty.
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.receiver.recv().await
    }

    /// Take the next envelope if one is queued.
    pub fn try_recv(&mut self) -> Option<Envelope> {
        self.receiver.try_recv().ok()
    }

    /// Take everything currently queued.
    pub fn drain(&mut self) -> Vec<Envelope> {
        let mut out = Vec::new();
        while let Ok(env) = self.receiver.try_recv() {
            out.push(env);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_local_pair_delivers_in_order() {
        let (tx, mut rx) = LocalTransport::pair();
        tx.send(Envelope::new("s", 0, json!(1))).unwrap();
        tx.send(Envelope::new("s", 1, json!(2))).unwrap();
        assert_eq!(rx.recv().await.unwrap().seq, 0);
        assert_eq!(rx.recv().await.unwrap().seq, 1);
        assert!(rx.try_recv().is_none());
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (tx, rx) = LocalTransport::pair();
        drop(rx);
        assert!(tx.is_closed());
        let err = tx.send(Envelope::new("gone", 0, json!(null))).unwrap_err();
        assert!(matches!(err, ChannelError::Disconnected { stream } if stream == "gone"));
    }
}
