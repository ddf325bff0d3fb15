//! Confirmation prompts from capability call to user answer.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use skein_approval::{
    BrokerOptions, ConfirmRequest, ConfirmScope, DEFAULT_CONFIRM_STREAM, Decision,
    PermissionBroker,
};
use skein_capabilities::CapabilityError;
use skein_core::RunAt;
use skein_events::{DeliveryChannel, LocalTransport};
use skein_runtime::{RuntimeError, ScriptMetadata};
use skein_test::{MockConfirmHandler, fixtures, test_page, test_script_id};

mod common;

#[tokio::test]
async fn test_identical_concurrent_requests_prompt_once() {
    let (broker, mut rx) = common::bound_broker();
    let id = test_script_id("coalesce");

    let calls = (0..5).map(|_| broker.request_confirm(id, "GM_download", "file.zip", json!({})));
    let answer = async {
        let env = rx.recv().await.unwrap();
        let request: ConfirmRequest = serde_json::from_value(env.payload).unwrap();
        broker.handle_response(request.respond(Decision::Allow, ConfirmScope::Session));
    };
    let (decisions, ()) = tokio::join!(futures::future::join_all(calls), answer);

    assert!(decisions.iter().all(|d| *d == Decision::Allow));
    assert!(rx.try_recv().is_none());
}

#[tokio::test]
async fn test_prompt_sent_before_bind_is_delivered_on_bind() {
    let (transport, mut rx) = LocalTransport::pair();
    let channel = Arc::new(DeliveryChannel::new(Arc::new(transport)));
    let broker = Arc::new(PermissionBroker::new(Arc::clone(&channel)));
    let id = test_script_id("early");

    let ask = broker.request_confirm(id, "GM_xmlhttpRequest", "api.test", json!({}));
    let host = async {
        tokio::task::yield_now().await;
        assert_eq!(channel.pending(DEFAULT_CONFIRM_STREAM), 1);
        channel.bind(DEFAULT_CONFIRM_STREAM).unwrap();

        let env = rx.recv().await.unwrap();
        let request: ConfirmRequest = serde_json::from_value(env.payload).unwrap();
        assert_eq!(request.resource_key, "api.test");
        let response = request.respond(Decision::Deny, ConfirmScope::Session);
        broker.handle_payload(serde_json::to_value(response).unwrap())
    };
    let (decision, handled) = tokio::join!(ask, host);

    assert_eq!(decision, Decision::Deny);
    assert!(handled.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_unanswered_prompt_times_out_to_deny() {
    let (transport, _rx) = LocalTransport::pair();
    let channel = Arc::new(DeliveryChannel::new(Arc::new(transport)));
    let broker = PermissionBroker::with_options(
        channel,
        BrokerOptions {
            timeout: Duration::from_secs(5),
            ..BrokerOptions::default()
        },
    );

    let decision = broker
        .request_confirm(test_script_id("slow"), "GM_download", "x", json!(null))
        .await;
    assert_eq!(decision, Decision::Deny);
    assert_eq!(broker.pending(), 0);
}

#[tokio::test]
async fn test_navigation_to_gated_call() {
    let handler = MockConfirmHandler::new(Decision::Deny).with_answer(Decision::Allow);
    let (manager, fx, handler) = common::served_manager(handler);
    manager.install(
        ScriptMetadata::new(test_script_id("fetcher"), "fetcher")
            .with_match("*://*.example.com/*")
            .with_grant("GM_xmlhttpRequest")
            .with_grant("GM.getValue"),
    );

    let runs = manager.navigate("https://www.example.com/", RunAt::DocumentIdle, &test_page());
    assert_eq!(runs.len(), 1);
    let run = &runs[0];

    run.invoke("GM_xmlhttpRequest", json!([{"url": "https://api.example.com/a"}]))
        .await
        .unwrap();
    run.invoke("GM_xmlhttpRequest", json!([{"url": "https://api.example.com/b"}]))
        .await
        .unwrap();
    let denied = run
        .invoke("GM_xmlhttpRequest", json!([{"url": "https://tracker.test/"}]))
        .await
        .unwrap_err();
    assert!(matches!(
        denied,
        RuntimeError::Capability(CapabilityError::Denied { .. })
    ));

    assert_eq!(run.invoke("GM.getValue", json!(["k"])).await.unwrap(), json!("stored"));

    assert_eq!(handler.prompts(), 2);
    assert_eq!(fx.xhr.call_count(), 2);
    assert_eq!(fx.get_value.call_count(), 1);
}

#[tokio::test]
async fn test_concurrent_gated_calls_share_one_prompt() {
    let (manager, fx, handler) = common::served_manager(MockConfirmHandler::new(Decision::Allow));
    manager.install(
        ScriptMetadata::new(test_script_id("burst"), "burst")
            .with_match("*://example.com/*")
            .with_grant("GM_xmlhttpRequest"),
    );
    let run = manager.prepare(test_script_id("burst"), test_page()).unwrap();

    let calls = (0..4).map(|i| {
        run.invoke(
            "GM_xmlhttpRequest",
            json!([{"url": format!("https://api.example.com/{i}")}]),
        )
    });
    let results = futures::future::join_all(calls).await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(handler.prompts(), 1);
    assert_eq!(fx.xhr.call_count(), 4);
}

#[test]
fn test_fixture_mocks_are_shared_with_registry() {
    let fx = fixtures();
    assert_eq!(fx.xhr.call_count(), 0);
    assert!(fx.registry.contains("GM_xmlhttpRequest"));
}
