//! Isolation between scripts and the page.

use serde_json::json;
use skein_capabilities::{BindingSet, CapabilityResolver};
use skein_sandbox::{Value, build};
use skein_test::{fixture_registry, test_page};

#[test]
fn test_new_global_stays_private() {
    let page = test_page();
    let mut sandbox = build(BindingSet::empty(), page.clone());

    sandbox.set("helper", Value::from(json!({"x": 1})));

    assert_eq!(sandbox.get("helper").as_data(), Some(&json!({"x": 1})));
    assert!(page.get("helper").is_undefined());
    assert!(!page.has_own("helper"));
}

#[test]
fn test_existing_page_global_is_shared() {
    let page = test_page();
    let mut first = build(BindingSet::empty(), page.clone());
    let second = build(BindingSet::empty(), page.clone());

    first.set("onload", Value::from(json!("first handler")));

    assert_eq!(page.get("onload").as_data(), Some(&json!("first handler")));
    assert_eq!(second.get("onload").as_data(), Some(&json!("first handler")));
}

#[test]
fn test_private_globals_do_not_cross_sandboxes() {
    let page = test_page();
    let mut first = build(BindingSet::empty(), page.clone());
    let second = build(BindingSet::empty(), page);

    first.set("counter", Value::from(json!(1)));
    assert!(second.get("counter").is_undefined());
}

#[test]
fn test_binding_visible_without_store_or_page() {
    let page = test_page();
    let resolver = CapabilityResolver::new(fixture_registry());
    let sandbox = build(resolver.resolve(&["GM_setValue"]), page.clone());

    assert!(sandbox.get("GM_setValue").as_capability().is_some());
    assert!(page.get("GM_setValue").is_undefined());
}

#[test]
fn test_page_reads_fall_through() {
    let page = test_page();
    let sandbox = build(BindingSet::empty(), page.clone());
    page.set("lateGlobal", Value::from(json!(true)));

    assert_eq!(sandbox.get("lateGlobal").as_data(), Some(&json!(true)));
    assert!(sandbox.get("neverDefined").is_undefined());
}
