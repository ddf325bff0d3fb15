//! Installed scripts and navigation dispatch.

use skein_approval::PermissionBroker;
use skein_capabilities::{CapabilityRegistry, CapabilityResolver};
use skein_core::{RunAt, ScriptId};
use skein_matcher::{MatcherOptions, SharedScriptMatcher};
use skein_sandbox::{PageGlobal, SandboxBuilder};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

use crate::error::{RuntimeError, RuntimeResult};
use crate::execution::Execution;
use crate::metadata::ScriptMetadata;

/// Keeps installed scripts, their URL registrations, and the shared
/// resolver and broker.
///
/// Only enabled scripts are registered with the matcher. Install,
/// uninstall, and enable changes hold the script table's write lock while
/// they touch the matcher, so the two never disagree.
pub struct ScriptManager {
    matcher: SharedScriptMatcher<ScriptId>,
    resolver: CapabilityResolver,
    broker: Arc<PermissionBroker>,
    scripts: RwLock<HashMap<ScriptId, ScriptMetadata>>,
}

impl ScriptManager {
    /// Create a manager with default matcher options.
    #[must_use]
    pub fn new(registry: Arc<CapabilityRegistry>, broker: Arc<PermissionBroker>) -> Self {
        Self::with_options(registry, broker, MatcherOptions::default())
    }

    /// Create a manager with explicit matcher options.
    #[must_use]
    pub fn with_options(
        registry: Arc<CapabilityRegistry>,
        broker: Arc<PermissionBroker>,
        options: MatcherOptions,
    ) -> Self {
        Self {
            matcher: SharedScriptMatcher::new(options),
            resolver: CapabilityResolver::new(registry),
            broker,
            scripts: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<ScriptId, ScriptMetadata>> {
        self.scripts.read().unwrap_or_else(|e| {
            warn!("script table read lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ScriptId, ScriptMetadata>> {
        self.scripts.write().unwrap_or_else(|e| {
            warn!("script table write lock poisoned, recovering");
            e.into_inner()
        })
    }

    /// Install or update a script, returning the metadata it replaced.
    pub fn install(&self, metadata: ScriptMetadata) -> Option<ScriptMetadata> {
        let id = metadata.id;
        let mut scripts = self.write();
        if metadata.enabled {
            self.matcher.replace(&id, &metadata.pattern_set());
        } else {
            self.matcher.unregister(&id);
        }
        info!(
            script_id = %id,
            name = %metadata.name,
            enabled = metadata.enabled,
            grants = metadata.grants.len(),
            "installed script"
        );
        scripts.insert(id, metadata)
    }

    /// Remove a script.
    ///
    /// Pending confirmations for it resolve to deny and its cached
    /// decisions are forgotten.
    pub fn uninstall(&self, id: ScriptId) -> Option<ScriptMetadata> {
        let removed = {
            let mut scripts = self.write();
            self.matcher.unregister(&id);
            scripts.remove(&id)
        };
        if removed.is_some() {
            let discarded = self.broker.discard_script(id);
            let revoked = self.broker.revoke(id);
            info!(script_id = %id, discarded, revoked, "uninstalled script");
        }
        removed
    }

    /// Enable or disable a script.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::NotInstalled`] for an unknown ID.
    pub fn set_enabled(&self, id: ScriptId, enabled: bool) -> RuntimeResult<()> {
        let mut scripts = self.write();
        let meta = scripts.get_mut(&id).ok_or(RuntimeError::NotInstalled(id))?;
        if meta.enabled == enabled {
            return Ok(());
        }
        meta.enabled = enabled;
        if enabled {
            self.matcher.replace(&id, &meta.pattern_set());
        } else {
            self.matcher.unregister(&id);
            self.broker.discard_script(id);
        }
        debug!(script_id = %id, enabled, "script enabled state changed");
        Ok(())
    }

    /// Enabled scripts for `url` at `run_at`, in registration order.
    #[must_use]
    pub fn scripts_for(&self, url: &str, run_at: RunAt) -> Vec<ScriptId> {
        let scripts = self.read();
        self.matcher
            .match_url(url)
            .into_iter()
            .filter(|id| {
                scripts
                    .get(id)
                    .is_some_and(|meta| meta.enabled && meta.run_at == run_at)
            })
            .collect()
    }

    /// Build an execution for one script against `page`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::NotInstalled`] or [`RuntimeError::Disabled`].
    pub fn prepare(&self, id: ScriptId, page: PageGlobal) -> RuntimeResult<Execution> {
        let meta = self
            .read()
            .get(&id)
            .cloned()
            .ok_or(RuntimeError::NotInstalled(id))?;
        if !meta.enabled {
            return Err(RuntimeError::Disabled(id));
        }

        let bindings = self.resolver.resolve(&meta.grants);
        if !bindings.dropped().is_empty() {
            debug!(
                script_id = %id,
                dropped = ?bindings.dropped(),
                "script requested unknown grants"
            );
        }
        let sandbox = SandboxBuilder::new().script(id).build(bindings, page);
        Ok(Execution::new(meta, sandbox, Arc::clone(&self.broker)))
    }

    /// Prepare every script that applies to a navigation.
    ///
    /// A script removed between matching and preparation is skipped.
    #[must_use]
    pub fn navigate(&self, url: &str, run_at: RunAt, page: &PageGlobal) -> Vec<Execution> {
        let ids = self.scripts_for(url, run_at);
        debug!(url, %run_at, matched = ids.len(), "navigation");
        ids.into_iter()
            .filter_map(|id| match self.prepare(id, page.clone()) {
                Ok(execution) => Some(execution),
                Err(e) => {
                    debug!(script_id = %id, error = %e, "skipping script");
                    None
                },
            })
            .collect()
    }

    /// Metadata for an installed script.
    #[must_use]
    pub fn get(&self, id: ScriptId) -> Option<ScriptMetadata> {
        self.read().get(&id).cloned()
    }

    /// IDs of every installed script.
    #[must_use]
    pub fn ids(&self) -> Vec<ScriptId> {
        let mut ids: Vec<ScriptId> = self.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of installed scripts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether nothing is installed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// The permission broker.
    #[must_use]
    pub fn broker(&self) -> &Arc<PermissionBroker> {
        &self.broker
    }

    /// The capability resolver.
    #[must_use]
    pub fn resolver(&self) -> &CapabilityResolver {
        &self.resolver
    }
}

impl fmt::Debug for ScriptManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptManager")
            .field("scripts", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
