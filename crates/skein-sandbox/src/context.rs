//! Sandbox construction and property access.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use skein_capabilities::{BindingSet, CapabilityImpl, TopLevel};
use skein_core::ScriptId;
use tracing::trace;

use crate::page::PageGlobal;
use crate::value::Value;

/// Build a sandbox for an anonymous execution.
#[must_use]
pub fn build(bindings: BindingSet, page: PageGlobal) -> SandboxContext {
    SandboxBuilder::new().build(bindings, page)
}

/// Configures a [`SandboxContext`] before it is built.
#[derive(Debug, Default)]
pub struct SandboxBuilder {
    script_id: Option<ScriptId>,
    preset: Vec<(String, Value)>,
}

impl SandboxBuilder {
    /// Create a builder with no script and no preset globals.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag the sandbox with the script it runs.
    #[must_use]
    pub fn script(mut self, script_id: ScriptId) -> Self {
        self.script_id = Some(script_id);
        self
    }

    /// Seed the private store with a global.
    #[must_use]
    pub fn global(mut self, key: impl Into<String>, value: Value) -> Self {
        self.preset.push((key.into(), value));
        self
    }

    /// Build the sandbox. Never fails.
    #[must_use]
    pub fn build(self, bindings: BindingSet, page: PageGlobal) -> SandboxContext {
        trace!(
            script_id = ?self.script_id,
            bindings = bindings.len(),
            preset = self.preset.len(),
            "building sandbox"
        );
        SandboxContext {
            script_id: self.script_id,
            bindings,
            page,
            store: self.preset.into_iter().collect(),
        }
    }
}

/// An isolated global namespace for one script execution.
pub struct SandboxContext {
    script_id: Option<ScriptId>,
    bindings: BindingSet,
    page: PageGlobal,
    store: HashMap<String, Value>,
}

impl SandboxContext {
    /// Read a global: private store, then bindings, then the page.
    #[must_use]
    pub fn get(&self, key: &str) -> Value {
        if let Some(value) = self.store.get(key) {
            return value.clone();
        }
        if let Some(found) = self.bindings.lookup(key) {
            return match found {
                TopLevel::Binding(binding) => match binding.implementation() {
                    CapabilityImpl::PageGlobal => Value::Global(self.page.clone()),
                    CapabilityImpl::Function(_) | CapabilityImpl::Constant(_) => {
                        Value::Capability(binding.clone())
                    },
                },
                TopLevel::Namespace(ns) => Value::Namespace(Arc::clone(ns)),
            };
        }
        self.page.get(key)
    }

    /// Assign a global.
    ///
    /// Existing page properties are written through. Everything else stays
    /// in the private store.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if let Err(value) = self.page.set_existing(&key, value) {
            self.store.insert(key, value);
        }
    }

    /// Whether `key` resolves to anything.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.store.contains_key(key)
            || self.bindings.lookup(key).is_some()
            || self.page.has_own(key)
    }

    /// Delete a private global. Bindings and page properties are untouched.
    pub fn delete(&mut self, key: &str) -> bool {
        self.store.remove(key).is_some()
    }

    /// Names in the private store, sorted.
    #[must_use]
    pub fn own_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.store.keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    /// The script this sandbox runs, if tagged.
    #[must_use]
    pub fn script_id(&self) -> Option<ScriptId> {
        self.script_id
    }

    /// The capability bindings.
    #[must_use]
    pub fn bindings(&self) -> &BindingSet {
        &self.bindings
    }

    /// The page global.
    #[must_use]
    pub fn page(&self) -> &PageGlobal {
        &self.page
    }
}

impl fmt::Debug for SandboxContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SandboxContext")
            .field("script_id", &self.script_id)
            .field("bindings", &self.bindings.len())
            .field("own_keys", &self.store.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use skein_capabilities::{
        Capability, CapabilityCall, CapabilityEntry, CapabilityRegistry, CapabilityResolver,
        CapabilityResult, UNSAFE_WINDOW,
    };

    struct Noop;

    #[async_trait]
    impl Capability for Noop {
        async fn invoke(&self, _call: CapabilityCall) -> CapabilityResult<serde_json::Value> {
            Ok(serde_json::Value::Null)
        }
    }

    fn bindings(grants: &[&str]) -> BindingSet {
        let registry = CapabilityRegistry::with_builtins()
            .with("GM_setValue", CapabilityEntry::function(Arc::new(Noop)))
            .with("GM.getValue", CapabilityEntry::function(Arc::new(Noop)));
        CapabilityResolver::new(Arc::new(registry)).resolve(grants)
    }

    #[test]
    fn test_new_global_stays_private() {
        let page = PageGlobal::new();
        let mut sb = build(BindingSet::empty(), page.clone());

        sb.set("helper", Value::from(json!(1)));

        assert_eq!(sb.get("helper").as_data(), Some(&json!(1)));
        assert!(!page.has_own("helper"));
        assert_eq!(sb.own_keys(), vec!["helper"]);
    }

    #[test]
    fn test_existing_page_key_writes_through_to_other_sandboxes() {
        let page = PageGlobal::new().with("jQuery", Value::from(json!("v1")));
        let mut a = build(BindingSet::empty(), page.clone());
        let b = build(BindingSet::empty(), page.clone());

        a.set("jQuery", Value::from(json!("v2")));

        assert_eq!(b.get("jQuery").as_data(), Some(&json!("v2")));
        assert!(a.own_keys().is_empty());
    }

    #[test]
    fn test_binding_only_read() {
        let sb = build(bindings(&["GM_setValue"]), PageGlobal::new());
        let v = sb.get("GM_setValue");
        assert_eq!(v.as_capability().unwrap().grant(), "GM_setValue");
    }

    #[test]
    fn test_missing_read_is_undefined() {
        let sb = build(BindingSet::empty(), PageGlobal::new());
        assert!(sb.get("nothing").is_undefined());
        assert!(!sb.has("nothing"));
    }

    #[test]
    fn test_namespace_member_read() {
        let sb = build(bindings(&["GM.getValue"]), PageGlobal::new());
        let gm = sb.get("GM");
        assert_eq!(gm.member("getValue").as_capability().unwrap().grant(), "GM.getValue");
        assert!(gm.member("setValue").is_undefined());
    }

    #[test]
    fn test_private_store_shadows_bindings_and_page() {
        let page = PageGlobal::new().with("title", Value::from(json!("page")));
        let mut sb = build(bindings(&["GM_setValue"]), page.clone());

        sb.set("GM_setValue", Value::from(json!("mine")));
        assert_eq!(sb.get("GM_setValue").as_data(), Some(&json!("mine")));

        assert!(sb.delete("GM_setValue"));
        assert!(sb.get("GM_setValue").as_capability().is_some());
        assert!(!sb.delete("title"));
        assert!(page.has_own("title"));
    }

    #[test]
    fn test_unsafe_window_is_the_page() {
        let page = PageGlobal::new().with("secret", Value::from(json!(7)));
        let sb = build(bindings(&[UNSAFE_WINDOW]), page.clone());
        let win = sb.get(UNSAFE_WINDOW);
        assert!(win.as_global().unwrap().ptr_eq(&page));
        assert_eq!(win.member("secret").as_data(), Some(&json!(7)));
    }

    #[test]
    fn test_page_read_fallback_and_builder() {
        let script = ScriptId::new();
        let page = PageGlobal::new().with("document", Value::from(json!({"title": "t"})));
        let sb = SandboxBuilder::new()
            .script(script)
            .global("GM_info", Value::from(json!({"script": {"name": "demo"}})))
            .build(BindingSet::empty(), page);

        assert_eq!(sb.script_id(), Some(script));
        assert_eq!(sb.get("document").member("title").as_data(), Some(&json!("t")));
        assert!(sb.has("GM_info"));
        assert!(sb.has("document"));
    }

    #[test]
    fn test_sandboxes_do_not_see_each_others_privates() {
        let page = PageGlobal::new();
        let mut a = build(BindingSet::empty(), page.clone());
        let b = build(BindingSet::empty(), page);
        a.set("x", Value::from(json!(1)));
        assert!(b.get("x").is_undefined());
    }
}
