//! Remembered decisions.

use std::collections::HashMap;
use std::fmt;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use skein_core::{ScriptId, Timestamp};
use tracing::trace;

use crate::request::{ConfirmKey, ConfirmScope, Decision};

/// Resource key that covers every resource of a `(script, capability)` pair.
pub const WILDCARD_RESOURCE: &str = "*";

#[derive(Debug, Clone, Copy)]
struct Entry {
    decision: Decision,
    expires_at: Option<Timestamp>,
}

impl Entry {
    fn is_live(&self) -> bool {
        self.expires_at.is_none_or(|t| !t.is_past())
    }
}

/// Thread-safe store of confirmation records.
///
/// Only `Allow` and `Deny` are ever stored; `AskAgain` and `Once`-scoped
/// answers pass straight through.
pub struct ConfirmationCache {
    entries: RwLock<HashMap<ConfirmKey, Entry>>,
    session_ttl: Option<Duration>,
}

impl ConfirmationCache {
    /// Create an empty cache whose session entries never expire.
    #[must_use]
    pub fn new() -> Self {
        Self::with_session_ttl(None)
    }

    /// Create an empty cache whose session entries expire after `ttl`.
    #[must_use]
    pub fn with_session_ttl(ttl: Option<Duration>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            session_ttl: ttl,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<ConfirmKey, Entry>> {
        self.entries.read().unwrap_or_else(|e| {
            tracing::warn!("ConfirmationCache read lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ConfirmKey, Entry>> {
        self.entries.write().unwrap_or_else(|e| {
            tracing::warn!("ConfirmationCache write lock poisoned, recovering");
            e.into_inner()
        })
    }

    /// Look up a live decision, exact key first, then the wildcard resource.
    #[must_use]
    pub fn lookup(&self, key: &ConfirmKey) -> Option<Decision> {
        let entries = self.read();
        if let Some(entry) = entries.get(key).filter(|e| e.is_live()) {
            return Some(entry.decision);
        }
        if key.resource_key == WILDCARD_RESOURCE {
            return None;
        }
        let wildcard = ConfirmKey::new(key.script_id, &key.capability, WILDCARD_RESOURCE);
        entries
            .get(&wildcard)
            .filter(|e| e.is_live())
            .map(|e| e.decision)
    }

    /// Remember `decision` for `key` according to `scope`.
    ///
    /// Returns whether anything was stored.
    pub fn record(&self, key: ConfirmKey, decision: Decision, scope: ConfirmScope) -> bool {
        if decision == Decision::AskAgain {
            return false;
        }
        let expires_at = match scope {
            ConfirmScope::Once => return false,
            ConfirmScope::Session => self.session_ttl.map(|ttl| Timestamp::in_secs(ttl.as_secs())),
            ConfirmScope::Until(ts) => Some(ts),
        };
        trace!(%key, %decision, "caching confirmation");
        self.write().insert(
            key,
            Entry {
                decision,
                expires_at,
            },
        );
        true
    }

    /// Forget every decision for `script_id`. Returns how many were removed.
    pub fn revoke(&self, script_id: ScriptId) -> usize {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|k, _| k.script_id != script_id);
        before.saturating_sub(entries.len())
    }

    /// Forget one decision.
    pub fn forget(&self, key: &ConfirmKey) -> bool {
        self.write().remove(key).is_some()
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|_, e| e.is_live());
        before.saturating_sub(entries.len())
    }

    /// Forget everything.
    pub fn clear(&self) {
        self.write().clear();
    }

    /// Number of stored entries, including expired ones not yet purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl Default for ConfirmationCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConfirmationCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfirmationCache")
            .field("entries", &self.len())
            .field("session_ttl", &self.session_ttl)
            .finish()
    }
}
