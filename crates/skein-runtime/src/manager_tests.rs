use super::*;
use serde_json::json;
use skein_approval::{ConfirmHandler, DEFAULT_CONFIRM_STREAM, Decision};
use skein_capabilities::CapabilityError;
use skein_events::{DeliveryChannel, LocalTransport};
use skein_sandbox::Value;
use skein_test::{Fixtures, MockConfirmHandler, fixtures, test_page, test_script_id};

/// A manager whose confirmation prompts are answered by `handler`.
fn manager_with(
    handler: MockConfirmHandler,
) -> (Arc<ScriptManager>, Fixtures, Arc<MockConfirmHandler>) {
    let (transport, rx) = LocalTransport::pair();
    let channel = Arc::new(DeliveryChannel::new(Arc::new(transport)));
    channel.bind(DEFAULT_CONFIRM_STREAM).unwrap();
    let broker = Arc::new(PermissionBroker::new(channel));
    let handler = Arc::new(handler);
    let dyn_handler: Arc<dyn ConfirmHandler> = handler.clone();
    tokio::spawn(Arc::clone(&broker).serve(dyn_handler, rx));

    let fx = fixtures();
    let manager = Arc::new(ScriptManager::new(Arc::clone(&fx.registry), broker));
    (manager, fx, handler)
}

fn plain_manager() -> ScriptManager {
    let broker = Arc::new(PermissionBroker::new(Arc::new(DeliveryChannel::unbound())));
    ScriptManager::new(fixtures().registry, broker)
}

fn script(name: &str, pattern: &str) -> ScriptMetadata {
    ScriptMetadata::new(test_script_id(name), name).with_match(pattern)
}

#[test]
fn test_scripts_for_keeps_registration_order() {
    let m = plain_manager();
    m.install(script("ok", "*://*.baidu.com/"));
    m.install(script("ok4", "http://test.baidu.com/*"));

    assert_eq!(
        m.scripts_for("http://test.baidu.com/", RunAt::DocumentIdle),
        vec![test_script_id("ok"), test_script_id("ok4")]
    );
}

#[test]
fn test_scripts_for_filters_run_at_and_excludes() {
    let m = plain_manager();
    m.install(script("early", "*://example.com/*").with_run_at(RunAt::DocumentStart));
    m.install(script("idle", "*://example.com/*").with_exclude("*://example.com/admin/*"));

    assert_eq!(
        m.scripts_for("https://example.com/", RunAt::DocumentStart),
        vec![test_script_id("early")]
    );
    assert_eq!(
        m.scripts_for("https://example.com/", RunAt::DocumentIdle),
        vec![test_script_id("idle")]
    );
    assert!(m.scripts_for("https://example.com/admin/x", RunAt::DocumentIdle).is_empty());
}

#[test]
fn test_install_replaces_patterns() {
    let m = plain_manager();
    let id = test_script_id("moving");
    assert!(m.install(script("moving", "*://a.com/*")).is_none());
    let previous = m.install(script("moving", "*://b.com/*")).unwrap();
    assert_eq!(previous.matches, vec!["*://a.com/*"]);

    assert!(m.scripts_for("https://a.com/", RunAt::DocumentIdle).is_empty());
    assert_eq!(m.scripts_for("https://b.com/", RunAt::DocumentIdle), vec![id]);
    assert_eq!(m.len(), 1);
}

#[test]
fn test_disable_and_enable() {
    let m = plain_manager();
    let id = test_script_id("toggle");
    m.install(script("toggle", "*://example.com/*"));

    m.set_enabled(id, false).unwrap();
    assert!(m.scripts_for("https://example.com/", RunAt::DocumentIdle).is_empty());
    assert!(matches!(m.prepare(id, test_page()), Err(RuntimeError::Disabled(_))));

    m.set_enabled(id, true).unwrap();
    assert_eq!(m.scripts_for("https://example.com/", RunAt::DocumentIdle), vec![id]);

    let missing = test_script_id("missing");
    assert!(matches!(m.set_enabled(missing, true), Err(RuntimeError::NotInstalled(_))));
}

#[test]
fn test_disabled_install_is_not_matched() {
    let m = plain_manager();
    m.install(script("off", "*://example.com/*").disabled());
    assert!(m.scripts_for("https://example.com/", RunAt::DocumentIdle).is_empty());
    assert!(m.get(test_script_id("off")).is_some());
}

#[test]
fn test_uninstall() {
    let m = plain_manager();
    let id = test_script_id("gone");
    m.install(script("gone", "*://example.com/*"));
    assert!(m.uninstall(id).is_some());
    assert!(m.uninstall(id).is_none());
    assert!(m.is_empty());
    assert!(m.navigate("https://example.com/", RunAt::DocumentIdle, &test_page()).is_empty());
    assert!(matches!(m.prepare(id, test_page()), Err(RuntimeError::NotInstalled(_))));
}

#[test]
fn test_prepare_builds_fresh_sandbox_per_execution() {
    let m = plain_manager();
    m.install(
        script("grants", "*://example.com/*")
            .with_grant("GM_setValue")
            .with_grant("GM.getValue")
            .with_grant("GM_bogus"),
    );
    let page = test_page();
    let mut runs = m.navigate("https://example.com/", RunAt::DocumentIdle, &page);
    assert_eq!(runs.len(), 1);

    let run = &mut runs[0];
    assert!(run.sandbox().bindings().contains("GM_setValue"));
    assert!(run.sandbox().bindings().contains("GM_openStorage"));
    assert_eq!(run.sandbox().bindings().dropped(), ["GM_bogus"]);
    assert!(matches!(run.sandbox().get("GM"), Value::Namespace(_)));

    run.sandbox_mut().set("leaked", Value::from(json!(1)));
    assert!(page.get("leaked").is_undefined());

    let second = m.prepare(run.id(), page.clone()).unwrap();
    assert!(second.sandbox().get("leaked").is_undefined());
}

#[tokio::test]
async fn test_invoke_ungated_capability() {
    let (m, fx, handler) = manager_with(MockConfirmHandler::new(Decision::Deny));
    m.install(script("store", "*://example.com/*").with_grant("GM.getValue"));
    let run = m.prepare(test_script_id("store"), test_page()).unwrap();

    let out = run.invoke("GM.getValue", json!(["key"])).await.unwrap();
    assert_eq!(out, json!("stored"));
    assert_eq!(fx.get_value.call_count(), 1);
    assert_eq!(fx.get_value.calls()[0].grant, "GM.getValue");
    assert_eq!(handler.prompts(), 0);
}

#[tokio::test]
async fn test_invoke_errors() {
    let (m, _fx, _handler) = manager_with(MockConfirmHandler::new(Decision::Allow));
    m.install(script("errs", "*://example.com/*").with_grant("GM_info"));
    let run = m.prepare(test_script_id("errs"), test_page()).unwrap();

    let err = run.invoke("GM_setValue", json!([])).await.unwrap_err();
    assert!(matches!(err, RuntimeError::Capability(CapabilityError::NotGranted { .. })));

    let err = run.invoke("GM_info", json!([])).await.unwrap_err();
    assert!(matches!(err, RuntimeError::Capability(CapabilityError::NotCallable { .. })));
}

#[tokio::test]
async fn test_gated_invoke_allowed_then_cached() {
    let (m, fx, handler) = manager_with(MockConfirmHandler::new(Decision::Allow));
    m.install(script("net", "*://example.com/*").with_grant("GM_xmlhttpRequest"));
    let run = m.prepare(test_script_id("net"), test_page()).unwrap();
    let args = json!([{"url": "https://api.example.com/data"}]);

    run.invoke("GM_xmlhttpRequest", args.clone()).await.unwrap();
    run.invoke("GM_xmlhttpRequest", args).await.unwrap();

    assert_eq!(handler.prompts(), 1);
    assert_eq!(fx.xhr.call_count(), 2);
}

#[tokio::test]
async fn test_gated_invoke_denied_does_not_run() {
    let (m, fx, _handler) = manager_with(MockConfirmHandler::new(Decision::Deny));
    m.install(script("net", "*://example.com/*").with_grant("GM_xmlhttpRequest"));
    let run = m.prepare(test_script_id("net"), test_page()).unwrap();

    let err = run
        .invoke("GM_xmlhttpRequest", json!([{"url": "https://evil.test/"}]))
        .await
        .unwrap_err();
    match err {
        RuntimeError::Capability(CapabilityError::Denied { grant, resource }) => {
            assert_eq!(grant, "GM_xmlhttpRequest");
            assert_eq!(resource, "evil.test");
        },
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fx.xhr.call_count(), 0);
}

#[tokio::test]
async fn test_uninstall_revokes_cached_decisions() {
    let (m, _fx, handler) = manager_with(MockConfirmHandler::new(Decision::Allow));
    let meta = script("net", "*://example.com/*").with_grant("GM_xmlhttpRequest");
    let id = meta.id;
    let args = json!([{"url": "https://api.example.com/"}]);

    m.install(meta.clone());
    m.prepare(id, test_page()).unwrap().invoke("GM_xmlhttpRequest", args.clone()).await.unwrap();
    m.uninstall(id);
    assert!(m.broker().cache().is_empty());

    m.install(meta);
    m.prepare(id, test_page()).unwrap().invoke("GM_xmlhttpRequest", args).await.unwrap();
    assert_eq!(handler.prompts(), 2);
}
