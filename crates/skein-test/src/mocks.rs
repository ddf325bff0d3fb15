//! Mock implementations for testing.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use skein_approval::{ConfirmHandler, ConfirmRequest, ConfirmResponse, ConfirmScope, Decision};
use skein_capabilities::{Capability, CapabilityCall, CapabilityError, CapabilityResult};
use skein_events::{ChannelError, ChannelResult, Envelope, Transport};

/// Transport that records every envelope it is handed.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<Envelope>>>,
}

impl RecordingTransport {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far, in send order.
    #[must_use]
    pub fn sent(&self) -> Vec<Envelope> {
        self.sent.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Payloads sent on `stream`, in send order.
    #[must_use]
    pub fn payloads(&self, stream: &str) -> Vec<Value> {
        self.sent()
            .into_iter()
            .filter(|e| e.stream == stream)
            .map(|e| e.payload)
            .collect()
    }

    /// Number of envelopes sent.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sent.lock().map(|g| g.len()).unwrap_or_default()
    }

    /// Whether nothing has been sent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget recorded envelopes.
    pub fn clear(&self) {
        if let Ok(mut guard) = self.sent.lock() {
            guard.clear();
        }
    }
}

impl Transport for RecordingTransport {
    fn send(&self, envelope: Envelope) -> ChannelResult<()> {
        if let Ok(mut guard) = self.sent.lock() {
            guard.push(envelope);
        }
        Ok(())
    }
}

/// Transport whose every send fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingTransport;

impl Transport for FailingTransport {
    fn send(&self, envelope: Envelope) -> ChannelResult<()> {
        Err(ChannelError::Transport(format!(
            "refusing envelope {} on {}",
            envelope.seq, envelope.stream
        )))
    }
}

/// Capability that records its calls and returns a fixed result.
#[derive(Debug, Clone)]
pub struct MockCapability {
    result: Value,
    failure: Option<String>,
    resource_field: Option<String>,
    calls: Arc<Mutex<Vec<CapabilityCall>>>,
}

impl MockCapability {
    /// A capability returning `result`.
    #[must_use]
    pub fn returning(result: Value) -> Self {
        Self {
            result,
            failure: None,
            resource_field: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A capability that always fails with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::returning(Value::Null)
        }
    }

    /// Require confirmation keyed on `args[0][field]`.
    ///
    /// URL values are reduced to their host.
    #[must_use]
    pub fn with_resource_field(mut self, field: impl Into<String>) -> Self {
        self.resource_field = Some(field.into());
        self
    }

    /// Calls received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<CapabilityCall> {
        self.calls.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Number of calls received.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|g| g.len()).unwrap_or_default()
    }
}

#[async_trait]
impl Capability for MockCapability {
    async fn invoke(&self, call: CapabilityCall) -> CapabilityResult<Value> {
        if let Ok(mut guard) = self.calls.lock() {
            guard.push(call);
        }
        match &self.failure {
            Some(message) => Err(CapabilityError::Failed(message.clone())),
            None => Ok(self.result.clone()),
        }
    }

    fn resource_key(&self, args: &Value) -> Option<String> {
        let field = self.resource_field.as_deref()?;
        let raw = args.get(0).and_then(|a| a.get(field)).and_then(Value::as_str)?;
        match url::Url::parse(raw) {
            Ok(url) => url.host_str().map(str::to_owned),
            Err(_) => Some(raw.to_owned()),
        }
    }
}

/// Confirmation handler that answers from a queue.
///
/// Uses `std::sync::Mutex` so builder methods need no runtime.
#[derive(Debug)]
pub struct MockConfirmHandler {
    answers: Mutex<VecDeque<Option<Decision>>>,
    default: Option<Decision>,
    scope: ConfirmScope,
    prompts: AtomicUsize,
}

impl MockConfirmHandler {
    /// A handler that answers `default` with session scope.
    #[must_use]
    pub fn new(default: Decision) -> Self {
        Self {
            answers: Mutex::new(VecDeque::new()),
            default: Some(default),
            scope: ConfirmScope::Session,
            prompts: AtomicUsize::new(0),
        }
    }

    /// A handler that dismisses every prompt.
    #[must_use]
    pub fn dismissing() -> Self {
        Self {
            default: None,
            ..Self::new(Decision::Deny)
        }
    }

    /// Queue an answer ahead of the default.
    #[must_use]
    pub fn with_answer(self, decision: Decision) -> Self {
        if let Ok(mut guard) = self.answers.lock() {
            guard.push_back(Some(decision));
        }
        self
    }

    /// Scope attached to every answer.
    #[must_use]
    pub fn with_scope(mut self, scope: ConfirmScope) -> Self {
        self.scope = scope;
        self
    }

    /// Number of prompts shown.
    #[must_use]
    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfirmHandler for MockConfirmHandler {
    async fn confirm(&self, request: &ConfirmRequest) -> Option<ConfirmResponse> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        let queued = self.answers.lock().ok().and_then(|mut g| g.pop_front());
        let decision = queued.unwrap_or(self.default)?;
        Some(request.respond(decision, self.scope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use skein_core::ScriptId;

    #[test]
    fn test_recording_transport_keeps_order() {
        let t = RecordingTransport::new();
        t.send(Envelope::new("a", 0, json!(1))).unwrap();
        t.send(Envelope::new("b", 0, json!(2))).unwrap();
        t.send(Envelope::new("a", 1, json!(3))).unwrap();
        assert_eq!(t.len(), 3);
        assert_eq!(t.payloads("a"), vec![json!(1), json!(3)]);
        t.clear();
        assert!(t.is_empty());
    }

    #[test]
    fn test_failing_transport() {
        assert!(FailingTransport.send(Envelope::new("a", 0, json!(null))).is_err());
    }

    #[tokio::test]
    async fn test_mock_capability_records_calls() {
        let cap = MockCapability::returning(json!("ok")).with_resource_field("url");
        let args = json!([{"url": "https://api.example.com/v1?q=1"}]);
        assert_eq!(cap.resource_key(&args).as_deref(), Some("api.example.com"));
        assert_eq!(cap.resource_key(&json!([{"url": "relative"}])).as_deref(), Some("relative"));
        assert!(cap.resource_key(&json!([])).is_none());

        let out = cap
            .invoke(CapabilityCall::new(ScriptId::new(), "GM_xmlhttpRequest", args))
            .await
            .unwrap();
        assert_eq!(out, json!("ok"));
        assert_eq!(cap.call_count(), 1);
    }
}
