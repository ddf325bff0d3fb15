//! The permission broker: cache, coalesce, prompt, resume.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde_json::Value;
use skein_core::ScriptId;
use skein_events::DeliveryChannel;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use crate::cache::ConfirmationCache;
use crate::error::{ApprovalError, ApprovalResult};
use crate::request::{
    ConfirmKey, ConfirmRequest, ConfirmResponse, ConfirmScope, Decision, RequestId,
};

/// Stream confirmation requests are dispatched on by default.
pub const DEFAULT_CONFIRM_STREAM: &str = "skein.permission.confirm";

/// Default time to wait for an answer (5 minutes).
pub const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Broker tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerOptions {
    /// Stream requests are dispatched on.
    pub confirm_stream: String,
    /// How long a caller waits before the request counts as denied.
    pub timeout: Duration,
    /// Expiry for session-scoped decisions. `None` keeps them for the
    /// broker's lifetime.
    pub cache_ttl: Option<Duration>,
}

impl Default for BrokerOptions {
    fn default() -> Self {
        Self {
            confirm_stream: DEFAULT_CONFIRM_STREAM.to_owned(),
            timeout: DEFAULT_CONFIRM_TIMEOUT,
            cache_ttl: None,
        }
    }
}

/// One outstanding prompt and everyone waiting on it.
struct PendingGroup {
    id: RequestId,
    tx: watch::Sender<Option<Decision>>,
}

/// Releases a group once its last waiter stops listening.
///
/// Must be dropped after the waiter's receiver.
struct AbandonGuard<'a> {
    broker: &'a PermissionBroker,
    id: RequestId,
}

impl Drop for AbandonGuard<'_> {
    fn drop(&mut self) {
        self.broker.abandon(&self.id);
    }
}

#[derive(Default)]
struct Inflight {
    by_key: HashMap<ConfirmKey, PendingGroup>,
    by_id: HashMap<RequestId, ConfirmKey>,
}

/// Issues confirmation prompts and remembers the answers.
///
/// Identical `(script, capability, resource)` requests that arrive while a
/// prompt is outstanding attach to it instead of prompting again.
pub struct PermissionBroker {
    channel: Arc<DeliveryChannel>,
    options: BrokerOptions,
    cache: ConfirmationCache,
    inflight: Mutex<Inflight>,
    closed: AtomicBool,
}

impl PermissionBroker {
    /// Create a broker with default options.
    #[must_use]
    pub fn new(channel: Arc<DeliveryChannel>) -> Self {
        Self::with_options(channel, BrokerOptions::default())
    }

    /// Create a broker with explicit options.
    #[must_use]
    pub fn with_options(channel: Arc<DeliveryChannel>, options: BrokerOptions) -> Self {
        Self {
            channel,
            cache: ConfirmationCache::with_session_ttl(options.cache_ttl),
            options,
            inflight: Mutex::new(Inflight::default()),
            closed: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inflight> {
        self.inflight.lock().unwrap_or_else(|e| {
            warn!("broker in-flight lock poisoned, recovering");
            e.into_inner()
        })
    }

    /// Ask whether `script_id` may use `capability` on `resource_key`.
    ///
    /// Resolves from the cache when possible. Otherwise waits for the
    /// response to a single shared prompt, or for the timeout, which counts
    /// as [`Decision::Deny`] and is not cached.
    pub async fn request_confirm(
        &self,
        script_id: ScriptId,
        capability: &str,
        resource_key: &str,
        detail: Value,
    ) -> Decision {
        if self.closed.load(Ordering::Acquire) {
            debug!(%script_id, capability, "broker shut down, denying");
            return Decision::Deny;
        }

        let key = ConfirmKey::new(script_id, capability, resource_key);
        if let Some(decision) = self.cache.lookup(&key) {
            trace!(%key, %decision, "confirmation cache hit");
            return decision;
        }

        let (id, rx, leader) = {
            let mut inflight = self.lock();
            // Re-check under the lock: a response may have landed since the
            // first lookup, and `finish` caches before releasing the group.
            if let Some(decision) = self.cache.lookup(&key) {
                return decision;
            }
            if let Some(group) = inflight.by_key.get(&key) {
                trace!(%key, request_id = %group.id, "joining in-flight confirmation");
                (group.id.clone(), group.tx.subscribe(), false)
            } else {
                let id = RequestId::new();
                let (tx, rx) = watch::channel(None);
                inflight.by_id.insert(id.clone(), key.clone());
                inflight.by_key.insert(
                    key.clone(),
                    PendingGroup {
                        id: id.clone(),
                        tx,
                    },
                );
                (id, rx, true)
            }
        };

        // Declared before `rx` so it runs once the receiver is gone.
        let _abandon = AbandonGuard {
            broker: self,
            id: id.clone(),
        };
        let mut rx = rx;

        if leader {
            let request = ConfirmRequest::new(id.clone(), &key, detail);
            match serde_json::to_value(&request).map_err(ApprovalError::Encode) {
                Ok(payload) => {
                    info!(%key, request_id = %id, "requesting confirmation");
                    self.channel.dispatch(&self.options.confirm_stream, payload);
                },
                Err(e) => {
                    warn!(%key, error = %e, "could not send confirmation request");
                    self.finish(&id, Decision::Deny, None);
                },
            }
        }

        match tokio::time::timeout(self.options.timeout, rx.wait_for(Option::is_some)).await {
            Ok(Ok(decision)) => (*decision).unwrap_or(Decision::Deny),
            Ok(Err(_)) => Decision::Deny,
            Err(_) => {
                warn!(
                    %key,
                    request_id = %id,
                    timeout = ?self.options.timeout,
                    "confirmation timed out"
                );
                self.finish(&id, Decision::Deny, None);
                Decision::Deny
            },
        }
    }

    /// Resolve the group for `id`, caching under `scope` if given.
    fn finish(&self, id: &RequestId, decision: Decision, scope: Option<ConfirmScope>) -> bool {
        let group = {
            let mut inflight = self.lock();
            let Some(key) = inflight.by_id.remove(id) else {
                return false;
            };
            let group = inflight.by_key.remove(&key);
            if let Some(scope) = scope {
                self.cache.record(key, decision, scope);
            }
            group
        };
        match group {
            Some(group) => {
                group.tx.send_replace(Some(decision));
                true
            },
            None => false,
        }
    }

    /// Drop the group for `id` if no caller is waiting on it any more.
    fn abandon(&self, id: &RequestId) {
        let mut inflight = self.lock();
        let Some(key) = inflight.by_id.get(id).cloned() else {
            return;
        };
        let unwatched = inflight
            .by_key
            .get(&key)
            .is_none_or(|group| group.tx.receiver_count() == 0);
        if unwatched {
            inflight.by_id.remove(id);
            inflight.by_key.remove(&key);
            debug!(%key, request_id = %id, "all waiters gone, releasing confirmation");
        }
    }

    /// Deliver an answer from the privileged surface.
    ///
    /// Returns `false` if no prompt with that id is outstanding (already
    /// answered, timed out, or discarded).
    pub fn handle_response(&self, response: ConfirmResponse) -> bool {
        let resolved = self.finish(&response.id, response.decision, Some(response.scope));
        if resolved {
            debug!(
                request_id = %response.id,
                decision = %response.decision,
                "confirmation answered"
            );
        } else {
            debug!(request_id = %response.id, "ignoring response for unknown request");
        }
        resolved
    }

    /// Decode and deliver a response payload received over a channel.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::MalformedResponse`] if the payload is not a
    /// [`ConfirmResponse`].
    pub fn handle_payload(&self, payload: Value) -> ApprovalResult<bool> {
        let response: ConfirmResponse =
            serde_json::from_value(payload).map_err(ApprovalError::MalformedResponse)?;
        Ok(self.handle_response(response))
    }

    /// Release every in-flight prompt belonging to `script_id`.
    ///
    /// Waiters resolve to [`Decision::Deny`]. Returns the number of prompts
    /// released.
    pub fn discard_script(&self, script_id: ScriptId) -> usize {
        self.release_where(|key| key.script_id == script_id)
    }

    /// Forget cached decisions for `script_id`.
    pub fn revoke(&self, script_id: ScriptId) -> usize {
        let removed = self.cache.revoke(script_id);
        debug!(%script_id, removed, "revoked cached confirmations");
        removed
    }

    /// Release every in-flight prompt and deny all future requests.
    pub fn shutdown(&self) -> usize {
        self.closed.store(true, Ordering::Release);
        let released = self.release_where(|_| true);
        info!(released, "permission broker shut down");
        released
    }

    fn release_where(&self, mut predicate: impl FnMut(&ConfirmKey) -> bool) -> usize {
        let groups: Vec<PendingGroup> = {
            let mut inflight = self.lock();
            let keys: Vec<ConfirmKey> = inflight
                .by_key
                .keys()
                .filter(|k| predicate(k))
                .cloned()
                .collect();
            keys.into_iter()
                .filter_map(|k| {
                    let group = inflight.by_key.remove(&k)?;
                    inflight.by_id.remove(&group.id);
                    Some(group)
                })
                .collect()
        };
        for group in &groups {
            group.tx.send_replace(Some(Decision::Deny));
        }
        groups.len()
    }

    /// Number of prompts awaiting an answer.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.lock().by_key.len()
    }

    /// The decision cache.
    #[must_use]
    pub fn cache(&self) -> &ConfirmationCache {
        &self.cache
    }

    /// The broker's options.
    #[must_use]
    pub fn options(&self) -> &BrokerOptions {
        &self.options
    }

    /// The channel requests are dispatched on.
    #[must_use]
    pub fn channel(&self) -> &Arc<DeliveryChannel> {
        &self.channel
    }
}

impl fmt::Debug for PermissionBroker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionBroker")
            .field("options", &self.options)
            .field("pending", &self.pending())
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "broker_tests.rs"]
mod tests;
