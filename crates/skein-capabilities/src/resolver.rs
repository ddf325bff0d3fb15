//! Grant resolution.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::binding::{BindingSet, BindingSetBuilder};
use crate::registry::{CapabilityRegistry, GRANT_NONE};

/// Turns a script's grant list into a [`BindingSet`].
#[derive(Clone)]
pub struct CapabilityResolver {
    registry: Arc<CapabilityRegistry>,
}

impl CapabilityResolver {
    /// Create a resolver over an explicit registry.
    #[must_use]
    pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
        Self { registry }
    }

    /// The registry grants are looked up in.
    #[must_use]
    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Resolve `grants` and their transitive dependencies.
    ///
    /// - Unknown grants are dropped (see [`BindingSet::dropped`]).
    /// - Each name is resolved at most once, so dependency cycles terminate.
    /// - `none` contributes nothing.
    ///
    /// The returned set is new on every call.
    #[must_use]
    pub fn resolve<S: AsRef<str>>(&self, grants: &[S]) -> BindingSet {
        let mut builder = BindingSetBuilder::default();
        let mut visited: HashSet<String> = HashSet::new();

        for grant in grants {
            let grant = grant.as_ref().trim();
            if grant.is_empty() || grant == GRANT_NONE {
                continue;
            }
            if !self.registry.contains(grant) {
                debug!(grant, "dropping unknown grant");
                if visited.insert(grant.to_owned()) {
                    builder.drop_grant(grant);
                }
                continue;
            }
            self.visit(grant, &mut visited, &mut builder);
        }

        let set = builder.finish();
        trace!(
            resolved = set.len(),
            dropped = set.dropped().len(),
            "resolved grants"
        );
        set
    }

    /// Depth-first walk over `grant` and its dependencies.
    ///
    /// Uses an explicit stack so a pathological dependency chain cannot
    /// overflow the call stack.
    fn visit(&self, grant: &str, visited: &mut HashSet<String>, builder: &mut BindingSetBuilder) {
        let mut stack = vec![grant.to_owned()];
        while let Some(name) = stack.pop() {
            if !visited.insert(name.clone()) {
                continue;
            }
            let Some(entry) = self.registry.get(&name) else {
                warn!(
                    grant = %name,
                    required_by = grant,
                    "capability dependency is not registered"
                );
                builder.drop_grant(&name);
                continue;
            };
            builder.insert(&name, entry.implementation.clone());
            // Reverse so dependencies resolve in declaration order.
            stack.extend(entry.depends_on.iter().rev().cloned());
        }
    }
}

impl fmt::Debug for CapabilityResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityResolver")
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{Capability, CapabilityCall, CapabilityImpl};
    use crate::error::CapabilityResult;
    use crate::registry::{CapabilityEntry, UNSAFE_WINDOW};
    use async_trait::async_trait;
    use serde_json::{Value, json};

    struct Noop;

    #[async_trait]
    impl Capability for Noop {
        async fn invoke(&self, _call: CapabilityCall) -> CapabilityResult<Value> {
            Ok(Value::Null)
        }
    }

    fn registry() -> CapabilityRegistry {
        CapabilityRegistry::with_builtins()
            .with("GM_setValue", CapabilityEntry::function(Arc::new(Noop)))
            .with("GM_openStorage", CapabilityEntry::function(Arc::new(Noop)))
            .with(
                "GM.getValue",
                CapabilityEntry::function(Arc::new(Noop)).depends_on("GM_openStorage"),
            )
            .with("GM_info", CapabilityEntry::constant(json!({"script": "x"})))
    }

    fn resolver() -> CapabilityResolver {
        CapabilityResolver::new(Arc::new(registry()))
    }

    #[test]
    fn test_flat_and_namespaced_with_dependency() {
        let set = resolver().resolve(&["GM_setValue", "GM.getValue"]);

        assert!(set.get("GM_setValue").is_some());
        let gm = set.namespace("GM").unwrap();
        assert!(gm.get("getValue").is_some());
        assert!(set.get("GM_openStorage").is_some());
        assert_eq!(set.names(), ["GM_setValue", "GM.getValue", "GM_openStorage"]);
    }

    #[test]
    fn test_unknown_grants_dropped() {
        let set = resolver().resolve(&["GM_bogus", "GM_setValue", "GM_bogus"]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.dropped(), ["GM_bogus"]);
    }

    #[test]
    fn test_none_and_empty_grants() {
        let set = resolver().resolve(&[GRANT_NONE, ""]);
        assert!(set.is_empty());
        assert!(set.dropped().is_empty());
    }

    #[test]
    fn test_duplicates_and_already_resolved_dependencies() {
        let set = resolver().resolve(&["GM_openStorage", "GM.getValue", "GM.getValue"]);
        assert_eq!(set.names(), ["GM_openStorage", "GM.getValue"]);
    }

    #[test]
    fn test_dependency_cycle_terminates() {
        let reg = CapabilityRegistry::new()
            .with("A", CapabilityEntry::constant(json!(1)).depends_on("B"))
            .with("B", CapabilityEntry::constant(json!(2)).depends_on("C"))
            .with("C", CapabilityEntry::constant(json!(3)).depends_on("A"));
        let set = CapabilityResolver::new(Arc::new(reg)).resolve(&["A"]);
        assert_eq!(set.names(), ["A", "B", "C"]);
    }

    #[test]
    fn test_missing_dependency_is_dropped() {
        let reg = CapabilityRegistry::new()
            .with("GM_x", CapabilityEntry::constant(json!(1)).depends_on("GM_missing"));
        let set = CapabilityResolver::new(Arc::new(reg)).resolve(&["GM_x"]);
        assert!(set.contains("GM_x"));
        assert_eq!(set.dropped(), ["GM_missing"]);
    }

    #[test]
    fn test_each_resolve_is_fresh() {
        let r = resolver();
        let a = r.resolve(&["GM_info"]);
        let b = r.resolve(&["GM_info"]);
        let pa: *const _ = a.get("GM_info").unwrap();
        let pb: *const _ = b.get("GM_info").unwrap();
        assert_ne!(pa, pb);
    }

    #[test]
    fn test_unsafe_window_builtin() {
        let set = resolver().resolve(&[UNSAFE_WINDOW]);
        assert!(matches!(
            set.get(UNSAFE_WINDOW).unwrap().implementation(),
            CapabilityImpl::PageGlobal
        ));
    }
}
