//! Shared setup for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use skein_approval::{ConfirmHandler, DEFAULT_CONFIRM_STREAM, PermissionBroker};
use skein_events::{DeliveryChannel, LocalReceiver, LocalTransport};
use skein_runtime::ScriptManager;
use skein_test::{Fixtures, MockConfirmHandler, fixtures};

/// A broker over a bound in-process channel, plus the far end.
pub fn bound_broker() -> (Arc<PermissionBroker>, LocalReceiver) {
    let (transport, rx) = LocalTransport::pair();
    let channel = Arc::new(DeliveryChannel::new(Arc::new(transport)));
    channel.bind(DEFAULT_CONFIRM_STREAM).unwrap();
    (Arc::new(PermissionBroker::new(channel)), rx)
}

/// A script manager whose prompts are answered in-process by `handler`.
pub fn served_manager(
    handler: MockConfirmHandler,
) -> (ScriptManager, Fixtures, Arc<MockConfirmHandler>) {
    let (broker, rx) = bound_broker();
    let handler = Arc::new(handler);
    let dyn_handler: Arc<dyn ConfirmHandler> = handler.clone();
    tokio::spawn(Arc::clone(&broker).serve(dyn_handler, rx));

    let fx = fixtures();
    let manager = ScriptManager::new(Arc::clone(&fx.registry), broker);
    (manager, fx, handler)
}

/// A script manager over an unbound channel, for tests that never prompt.
pub fn plain_manager() -> ScriptManager {
    let broker = Arc::new(PermissionBroker::new(Arc::new(DeliveryChannel::unbound())));
    ScriptManager::new(fixtures().registry, broker)
}
