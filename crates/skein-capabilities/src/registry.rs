//! The capability registry.
//!
//! Built explicitly at startup and handed to the resolver, so tests can use
//! an isolated registry per case.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::capability::{Capability, CapabilityImpl};

/// Grant that exposes the page's real global object.
pub const UNSAFE_WINDOW: &str = "unsafeWindow";

/// Grant value meaning "no privileged API at all".
pub const GRANT_NONE: &str = "none";

/// A registered capability: its implementation plus the grants it needs.
#[derive(Debug, Clone)]
pub struct CapabilityEntry {
    /// What the grant resolves to.
    pub implementation: CapabilityImpl,
    /// Grants resolved alongside this one.
    pub depends_on: Vec<String>,
}

impl CapabilityEntry {
    /// A callable capability.
    #[must_use]
    pub fn function(capability: Arc<dyn Capability>) -> Self {
        Self {
            implementation: CapabilityImpl::Function(capability),
            depends_on: Vec::new(),
        }
    }

    /// A constant value.
    #[must_use]
    pub fn constant(value: Value) -> Self {
        Self {
            implementation: CapabilityImpl::Constant(value),
            depends_on: Vec::new(),
        }
    }

    /// The page global passthrough.
    #[must_use]
    pub fn page_global() -> Self {
        Self {
            implementation: CapabilityImpl::PageGlobal,
            depends_on: Vec::new(),
        }
    }

    /// Add a dependency.
    #[must_use]
    pub fn depends_on(mut self, grant: impl Into<String>) -> Self {
        self.depends_on.push(grant.into());
        self
    }
}

/// Table from grant name to [`CapabilityEntry`].
#[derive(Default, Clone)]
pub struct CapabilityRegistry {
    entries: HashMap<String, CapabilityEntry>,
}

impl CapabilityRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the grants the core itself implements.
    ///
    /// Currently that is only [`UNSAFE_WINDOW`].
    #[must_use]
    pub fn with_builtins() -> Self {
        Self::new().with(UNSAFE_WINDOW, CapabilityEntry::page_global())
    }

    /// Register an entry, returning the one it replaced.
    pub fn register(
        &mut self,
        grant: impl Into<String>,
        entry: CapabilityEntry,
    ) -> Option<CapabilityEntry> {
        let grant = grant.into();
        debug!(
            grant = %grant,
            kind = entry.implementation.kind(),
            depends_on = entry.depends_on.len(),
            "registering capability"
        );
        self.entries.insert(grant, entry)
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, grant: impl Into<String>, entry: CapabilityEntry) -> Self {
        self.register(grant, entry);
        self
    }

    /// Remove an entry.
    pub fn unregister(&mut self, grant: &str) -> Option<CapabilityEntry> {
        self.entries.remove(grant)
    }

    /// Look up a grant. Case-sensitive.
    #[must_use]
    pub fn get(&self, grant: &str) -> Option<&CapabilityEntry> {
        self.entries.get(grant)
    }

    /// Whether a grant is registered.
    #[must_use]
    pub fn contains(&self, grant: &str) -> bool {
        self.entries.contains_key(grant)
    }

    /// Registered grant names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered grants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("grants", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_and_replace() {
        let mut reg = CapabilityRegistry::new();
        assert!(reg.register("GM_info", CapabilityEntry::constant(json!(1))).is_none());
        let old = reg.register("GM_info", CapabilityEntry::constant(json!(2)));
        assert!(matches!(
            old.map(|e| e.implementation),
            Some(CapabilityImpl::Constant(v)) if v == json!(1)
        ));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let reg =
            CapabilityRegistry::new().with("GM_setValue", CapabilityEntry::constant(json!(0)));
        assert!(reg.contains("GM_setValue"));
        assert!(!reg.contains("gm_setvalue"));
    }

    #[test]
    fn test_builtins_and_names() {
        let reg = CapabilityRegistry::with_builtins()
            .with("GM_b", CapabilityEntry::constant(json!(null)).depends_on("GM_a"));
        assert_eq!(reg.names(), vec!["GM_b", UNSAFE_WINDOW]);
        assert_eq!(reg.get("GM_b").unwrap().depends_on, vec!["GM_a"]);
        assert!(matches!(
            reg.get(UNSAFE_WINDOW).unwrap().implementation,
            CapabilityImpl::PageGlobal
        ));
    }

    #[test]
    fn test_unregister() {
        let mut reg = CapabilityRegistry::with_builtins();
        assert!(reg.unregister(UNSAFE_WINDOW).is_some());
        assert!(reg.is_empty());
    }
}
