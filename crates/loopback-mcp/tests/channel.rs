//! Channel integration tests against a hand-driven server port.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_test::{assert_err, assert_ok};

use loopback_mcp::transport::{duplex, Channel, LinkState, PortReceiver, PortSender};
use loopback_mcp::types::*;

// ─────────────────────── helpers ───────────────────────

/// A connected channel plus the raw halves of the server end.
async fn connected(timeout: Option<Duration>) -> (Arc<Channel>, PortSender, PortReceiver) {
    let (client, server) = duplex();
    let channel = Channel::with_timeout(client, timeout);
    assert_ok!(channel.connect().await);
    let (tx, rx) = server.into_split();
    (Arc::new(channel), tx, rx)
}

async fn next_request(rx: &mut PortReceiver) -> Envelope {
    let envelope = rx
        .recv_envelope()
        .await
        .expect("client hung up")
        .expect("undecodable frame");
    assert!(envelope.is_request(), "expected request, got {envelope:?}");
    envelope
}

fn spawn_send(channel: &Arc<Channel>, id: i64) -> tokio::task::JoinHandle<McpResult<Value>> {
    let channel = Arc::clone(channel);
    tokio::spawn(async move {
        channel
            .send(Envelope::request(RequestId::Number(id), "tools/list", None))
            .await
    })
}

// ─────────────────────── lifecycle ───────────────────────

#[tokio::test]
async fn test_send_before_connect_is_not_connected() {
    let (client, _server) = duplex();
    let channel = Channel::new(client);
    assert_eq!(channel.state(), LinkState::Idle);

    let err = assert_err!(channel.send(Envelope::request(1.into(), "tools/list", None)).await);
    assert!(matches!(err, McpError::NotConnected));
}

#[tokio::test]
async fn test_second_connect_is_refused() {
    let (channel, _tx, _rx) = connected(None).await;
    assert!(channel.is_connected());

    let err = assert_err!(channel.connect().await);
    assert!(matches!(err, McpError::NotConnectable(_)));
    assert!(channel.is_connected());
}

#[tokio::test]
async fn test_connect_to_vanished_peer_is_refused() {
    let (client, server) = duplex();
    drop(server);

    let channel = Channel::new(client);
    let err = assert_err!(channel.connect().await);
    assert!(matches!(err, McpError::NotConnectable(_)));
    assert_eq!(channel.state(), LinkState::Closed);
}

#[tokio::test]
async fn test_connect_after_disconnect_is_refused() {
    let (channel, _tx, _rx) = connected(None).await;
    channel.disconnect();
    assert_eq!(channel.state(), LinkState::Closed);

    let err = assert_err!(channel.connect().await);
    assert!(matches!(err, McpError::NotConnectable(_)));

    let err = assert_err!(channel.send(Envelope::request(1.into(), "tools/list", None)).await);
    assert!(matches!(err, McpError::NotConnected));
}

// ─────────────────────── correlation ───────────────────────

#[tokio::test]
async fn test_responses_out_of_order_reach_their_callers() {
    let (channel, tx, mut rx) = connected(None).await;

    let first = spawn_send(&channel, 1);
    let second = spawn_send(&channel, 2);

    let a = next_request(&mut rx).await;
    let b = next_request(&mut rx).await;

    // Answer in reverse order of arrival, each echoing its own id.
    for envelope in [b, a] {
        let id = envelope.id.clone().unwrap();
        assert_ok!(tx.post(&Envelope::success(id.clone(), json!({ "for": id.to_string() }))));
    }

    assert_eq!(first.await.unwrap().unwrap(), json!({ "for": "1" }));
    assert_eq!(second.await.unwrap().unwrap(), json!({ "for": "2" }));
    assert_eq!(channel.pending_count(), 0);
}

#[tokio::test]
async fn test_unmatched_response_is_dropped() {
    let (channel, tx, mut rx) = connected(None).await;
    let call = spawn_send(&channel, 7);

    let request = next_request(&mut rx).await;
    assert_ok!(tx.post(&Envelope::success(RequestId::Number(999), json!("stray"))));
    assert_ok!(tx.post(&Envelope::success(request.id.unwrap(), json!("mine"))));

    assert_eq!(call.await.unwrap().unwrap(), json!("mine"));
}

#[tokio::test]
async fn test_null_result_resolves_to_null() {
    let (channel, tx, mut rx) = connected(None).await;
    let call = spawn_send(&channel, 3);

    let request = next_request(&mut rx).await;
    assert_ok!(tx.post_frame(format!(
        r#"{{"jsonrpc":"2.0","id":{},"result":null}}"#,
        request.id.unwrap()
    )));

    assert_eq!(call.await.unwrap().unwrap(), Value::Null);
}

#[tokio::test]
async fn test_error_response_becomes_typed_failure() {
    let (channel, tx, mut rx) = connected(None).await;
    let call = spawn_send(&channel, 4);

    let request = next_request(&mut rx).await;
    let reply = McpError::ToolNotFound("nonexistent".to_string()).to_json_rpc_error(request.id.unwrap());
    assert_ok!(tx.post(&reply));

    let err = call.await.unwrap().unwrap_err();
    assert!(matches!(err, McpError::ToolNotFound(ref name) if name == "nonexistent"));
}

#[tokio::test]
async fn test_duplicate_in_flight_id_is_refused() {
    let (channel, tx, mut rx) = connected(None).await;
    let first = spawn_send(&channel, 5);
    let request = next_request(&mut rx).await;

    let err = assert_err!(channel.send(Envelope::request(5.into(), "tools/list", None)).await);
    assert!(matches!(err, McpError::DuplicateRequestId(RequestId::Number(5))));

    assert_ok!(tx.post(&Envelope::success(request.id.unwrap(), json!(1))));
    assert_eq!(first.await.unwrap().unwrap(), json!(1));

    // Once answered, the id may be used again.
    let again = spawn_send(&channel, 5);
    let request = next_request(&mut rx).await;
    assert_ok!(tx.post(&Envelope::success(request.id.unwrap(), json!(2))));
    assert_eq!(again.await.unwrap().unwrap(), json!(2));
}

#[tokio::test]
async fn test_notification_send_returns_null_immediately() {
    let (channel, _tx, mut rx) = connected(None).await;

    let value = assert_ok!(channel.send(Envelope::notification("notifications/initialized", None)).await);
    assert_eq!(value, Value::Null);
    assert_eq!(channel.pending_count(), 0);

    let delivered = rx.recv_envelope().await.unwrap().unwrap();
    assert!(delivered.is_notification());
}

// ─────────────────────── teardown ───────────────────────

#[tokio::test]
async fn test_disconnect_rejects_pending_requests() {
    let (channel, _tx, mut rx) = connected(None).await;
    let call = spawn_send(&channel, 10);
    next_request(&mut rx).await;
    assert_eq!(channel.pending_count(), 1);

    channel.disconnect();

    let err = call.await.unwrap().unwrap_err();
    assert!(matches!(err, McpError::Disconnected(RequestId::Number(10))));
    assert_eq!(channel.pending_count(), 0);
    assert!(!channel.is_connected());
}

#[tokio::test]
async fn test_remote_hangup_rejects_pending_requests() {
    let (channel, tx, mut rx) = connected(None).await;
    let call = spawn_send(&channel, 11);
    next_request(&mut rx).await;

    drop(tx);
    drop(rx);

    let err = call.await.unwrap().unwrap_err();
    assert!(matches!(err, McpError::Disconnected(RequestId::Number(11))));
    assert_eq!(channel.state(), LinkState::Closed);
}

#[tokio::test]
async fn test_timeout_rejects_and_clears_entry() {
    let (channel, _tx, mut rx) = connected(Some(Duration::from_millis(50))).await;
    let call = spawn_send(&channel, 12);
    next_request(&mut rx).await;

    let err = call.await.unwrap().unwrap_err();
    match err {
        McpError::Timeout { id, after } => {
            assert_eq!(id, RequestId::Number(12));
            assert_eq!(after, Duration::from_millis(50));
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert_eq!(channel.pending_count(), 0);
    assert!(channel.is_connected());
}

#[tokio::test]
async fn test_abandoned_call_clears_its_entry() {
    let (channel, _tx, mut rx) = connected(None).await;
    let call = spawn_send(&channel, 13);
    next_request(&mut rx).await;
    assert_eq!(channel.pending_count(), 1);

    call.abort();
    let _ = call.await;
    assert_eq!(channel.pending_count(), 0);
}

// ─────────────────────── notifications ───────────────────────

#[tokio::test]
async fn test_server_notification_reaches_handler() {
    let (channel, tx, _rx) = connected(None).await;
    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
    channel.on_notification("notifications/progress", move |params| {
        let _ = seen_tx.send(params);
    });

    assert_ok!(tx.post(&Envelope::notification("notifications/unhandled", None)));
    assert_ok!(tx.post(&Envelope::notification(
        "notifications/progress",
        Some(json!({ "progress": 50 }))
    )));

    let params = seen_rx.recv().await.unwrap();
    assert_eq!(params, Some(json!({ "progress": 50 })));
    assert!(channel.is_connected());
}

#[tokio::test]
async fn test_garbage_frames_do_not_break_the_channel() {
    let (channel, tx, mut rx) = connected(None).await;
    let call = spawn_send(&channel, 14);
    let request = next_request(&mut rx).await;

    assert_ok!(tx.post_frame("{ not json".to_string()));
    assert_ok!(tx.post(&Envelope::request(RequestId::Number(1), "sampling/create", None)));
    assert_ok!(tx.post(&Envelope::success(request.id.unwrap(), json!("ok"))));

    assert_eq!(call.await.unwrap().unwrap(), json!("ok"));
}
