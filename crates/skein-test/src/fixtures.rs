//! Test fixtures for common types.

use serde_json::{Value, json};
use std::sync::Arc;

use skein_capabilities::{CapabilityEntry, CapabilityRegistry};
use skein_core::ScriptId;
use skein_events::DeliveryChannel;
use skein_sandbox::{PageGlobal, Value as SandboxValue};

use crate::mocks::{MockCapability, RecordingTransport};

/// Grant names registered by [`fixtures`].
pub const FIXTURE_GRANTS: [&str; 6] = [
    "GM_setValue",
    "GM_openStorage",
    "GM.getValue",
    "GM_xmlhttpRequest",
    "GM_info",
    "unsafeWindow",
];

/// A registry plus handles on the mocks behind it.
#[derive(Debug, Clone)]
pub struct Fixtures {
    /// The registry.
    pub registry: Arc<CapabilityRegistry>,
    /// Behind `GM_setValue`.
    pub set_value: MockCapability,
    /// Behind `GM.getValue`.
    pub get_value: MockCapability,
    /// Behind `GM_openStorage`.
    pub open_storage: MockCapability,
    /// Behind `GM_xmlhttpRequest`; keyed on the request host.
    pub xhr: MockCapability,
}

/// Build the standard fixture registry.
///
/// - `GM_setValue` and `GM_openStorage` return `null`
/// - `GM.getValue` depends on `GM_openStorage` and returns `"stored"`
/// - `GM_xmlhttpRequest` needs confirmation per host of `args[0].url`
/// - `GM_info` is a constant
/// - `unsafeWindow` is the builtin page global
#[must_use]
pub fn fixtures() -> Fixtures {
    let set_value = MockCapability::returning(Value::Null);
    let get_value = MockCapability::returning(json!("stored"));
    let open_storage = MockCapability::returning(Value::Null);
    let xhr = MockCapability::returning(json!({"status": 200})).with_resource_field("url");

    let registry = CapabilityRegistry::with_builtins()
        .with("GM_setValue", CapabilityEntry::function(Arc::new(set_value.clone())))
        .with("GM_openStorage", CapabilityEntry::function(Arc::new(open_storage.clone())))
        .with(
            "GM.getValue",
            CapabilityEntry::function(Arc::new(get_value.clone())).depends_on("GM_openStorage"),
        )
        .with("GM_xmlhttpRequest", CapabilityEntry::function(Arc::new(xhr.clone())))
        .with(
            "GM_info",
            CapabilityEntry::constant(json!({"scriptHandler": "skein", "version": "0.1.0"})),
        );

    Fixtures {
        registry: Arc::new(registry),
        set_value,
        get_value,
        open_storage,
        xhr,
    }
}

/// The fixture registry without the mock handles.
#[must_use]
pub fn fixture_registry() -> Arc<CapabilityRegistry> {
    fixtures().registry
}

/// A script ID derived from `name`, stable across calls.
#[must_use]
pub fn test_script_id(name: &str) -> ScriptId {
    ScriptId::derive("skein-test", name)
}

/// A page global with a few well-known slots already present.
#[must_use]
pub fn test_page() -> PageGlobal {
    PageGlobal::new()
        .with("onload", SandboxValue::Data(Value::Null))
        .with("document", SandboxValue::Data(json!({"title": "Test Page"})))
        .with("location", SandboxValue::Data(json!({"href": "https://example.com/"})))
}

/// A channel whose default transport records every send.
#[must_use]
pub fn recording_channel() -> (Arc<DeliveryChannel>, RecordingTransport) {
    let transport = RecordingTransport::new();
    let channel = DeliveryChannel::new(Arc::new(transport.clone()));
    (Arc::new(channel), transport)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_registry_has_every_grant() {
        let registry = fixture_registry();
        for grant in FIXTURE_GRANTS {
            assert!(registry.contains(grant), "missing {grant}");
        }
        assert_eq!(
            registry.get("GM.getValue").unwrap().depends_on,
            vec!["GM_openStorage".to_owned()]
        );
    }

    #[test]
    fn test_script_id_is_stable() {
        assert_eq!(test_script_id("a"), test_script_id("a"));
        assert_ne!(test_script_id("a"), test_script_id("b"));
    }

    #[test]
    fn test_page_has_slots() {
        let page = test_page();
        assert!(page.has_own("onload"));
        assert!(!page.has_own("myHelper"));
    }
}
