mod common;

use common::{
    collect_events, expect_status, next_event, test_config, within, MockGateway, TOKEN,
};
use monitor_gateway::{ErrorKind, GatewayMonitor, Notification, SessionState};
use serde_json::json;
use std::time::{Duration, Instant};

fn event_types(notifications: &[Notification]) -> Vec<String> {
    notifications
        .iter()
        .filter_map(|n| match n {
            Notification::Event(event) => Some(event.event_type.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_connect_heartbeat_dispatch_and_reconnect() {
    let mut gateway = MockGateway::spawn().await;
    let (monitor, mut rx) = GatewayMonitor::new(test_config(&gateway.url));
    monitor.start_monitoring("m1");

    expect_status(&mut rx, "Connecting to gateway").await;
    let mut peer = gateway.next_peer().await;
    let (tag, _) = expect_status(&mut rx, "Connected to Discord Gateway").await;
    assert_eq!(tag, "m1");

    let identify = peer.expect_op(2).await;
    assert_eq!(identify["d"]["token"], TOKEN);
    assert_eq!(identify["d"]["intents"], 3_276_799);
    assert!(identify["d"]["properties"]["os"].is_string());

    let hello_sent = Instant::now();
    peer.hello(300).await;

    let first = peer.expect_op(1).await;
    let first_at = Instant::now();
    assert!(first["d"].is_null());
    assert!(first_at - hello_sent < Duration::from_millis(200));

    peer.expect_op(1).await;
    let second_at = Instant::now();
    assert!(second_at - first_at >= Duration::from_millis(200));
    assert_eq!(monitor.state(), SessionState::Heartbeating);

    peer.dispatch("MESSAGE_CREATE", 1, json!({"content": "hi", "id": "1"}))
        .await;
    let seen = collect_events(&mut rx, 1).await;
    assert_eq!(event_types(&seen), vec!["MESSAGE_CREATE"]);

    peer.close(4000, "").await;
    let (_, closed) = expect_status(&mut rx, "Connection closed: ").await;
    assert_eq!(closed, "Connection closed: Unknown error (4000)");

    let (tag, _) = expect_status(&mut rx, "Attempting to reconnect...").await;
    assert_eq!(tag, "m1");
    let (tag, _) = expect_status(&mut rx, "Connecting to gateway").await;
    assert_eq!(tag, "m1");

    let mut peer = gateway.next_peer().await;
    // Fresh handshake on every connection
    assert_eq!(peer.expect_op(2).await["d"]["token"], TOKEN);

    monitor.stop_monitoring("m1").await;
    assert_eq!(monitor.state(), SessionState::Disconnected);
}

#[tokio::test]
async fn test_stop_is_terminal() {
    let mut gateway = MockGateway::spawn().await;
    let (monitor, mut rx) = GatewayMonitor::new(test_config(&gateway.url));
    monitor.start_monitoring("m1");

    let mut peer = gateway.next_peer().await;
    peer.expect_op(2).await;
    peer.hello(50).await;
    peer.expect_op(1).await;

    monitor.stop_monitoring("m1").await;
    assert!(!monitor.is_monitoring());
    let (tag, _) = expect_status(&mut rx, "Monitoring stopped.").await;
    assert_eq!(tag, "m1");

    // The client closes its side; nothing follows the close
    within(peer.drain_until_closed()).await;
    assert!(gateway.try_next_peer(Duration::from_millis(600)).await.is_none());

    let mut late = Vec::new();
    while let Ok(notification) = rx.try_recv() {
        late.push(notification);
    }
    assert!(late.is_empty(), "unexpected notifications after stop: {late:?}");
}

#[tokio::test]
async fn test_malformed_frame_is_isolated() {
    let mut gateway = MockGateway::spawn().await;
    let (monitor, mut rx) = GatewayMonitor::new(test_config(&gateway.url));
    monitor.start_monitoring("m1");

    let mut peer = gateway.next_peer().await;
    peer.expect_op(2).await;
    peer.hello(10_000).await;

    peer.dispatch("MESSAGE_CREATE", 1, json!({"id": "first"})).await;
    peer.send_raw("{not json").await;
    peer.dispatch("MESSAGE_UPDATE", 2, json!({"id": "second"})).await;

    let seen = collect_events(&mut rx, 2).await;
    assert_eq!(event_types(&seen), vec!["MESSAGE_CREATE", "MESSAGE_UPDATE"]);

    let decode_errors: Vec<_> = seen
        .iter()
        .filter(|n| matches!(n, Notification::Error { kind: ErrorKind::Decode, .. }))
        .collect();
    assert_eq!(decode_errors.len(), 1);
    assert!(!seen
        .iter()
        .any(|n| matches!(n, Notification::Status { message, .. } if message.starts_with("Connection closed"))));

    monitor.stop_monitoring("m1").await;
}

#[tokio::test]
async fn test_presence_chatter_never_reaches_the_queue() {
    let mut gateway = MockGateway::spawn().await;
    let (monitor, mut rx) = GatewayMonitor::new(test_config(&gateway.url));
    monitor.start_monitoring("m1");

    let mut peer = gateway.next_peer().await;
    peer.expect_op(2).await;

    // Queued before Hello, delivered once the dispatcher runs
    peer.dispatch("PRESENCE_UPDATE", 1, json!({"status": "idle"})).await;
    peer.dispatch("GUILD_CREATE", 2, json!({"id": "g1"})).await;
    peer.hello(10_000).await;
    peer.dispatch("PRESENCE_UPDATE", 3, json!({"status": "online"})).await;
    peer.dispatch("MESSAGE_CREATE", 4, json!({"id": "m"})).await;

    let seen = collect_events(&mut rx, 2).await;
    assert_eq!(event_types(&seen), vec!["GUILD_CREATE", "MESSAGE_CREATE"]);

    let stats = monitor.queue_stats().unwrap();
    assert_eq!(stats.total_enqueued, 2);
    assert_eq!(stats.depth, 0);

    monitor.stop_monitoring("m1").await;
}

#[tokio::test]
async fn test_gateway_requested_reconnect() {
    let mut gateway = MockGateway::spawn().await;
    let (monitor, mut rx) = GatewayMonitor::new(test_config(&gateway.url));
    monitor.start_monitoring("m1");

    let mut peer = gateway.next_peer().await;
    peer.expect_op(2).await;
    peer.hello(10_000).await;
    peer.send_json(json!({"op": 7, "d": null})).await;

    let (_, closed) = expect_status(&mut rx, "Connection closed: ").await;
    assert_eq!(closed, "Connection closed: Reconnect requested by gateway");

    let mut peer = gateway.next_peer().await;
    peer.expect_op(2).await;
    monitor.stop_monitoring("m1").await;
}

#[tokio::test]
async fn test_resume_after_drop() {
    let mut gateway = MockGateway::spawn().await;
    let config = test_config(&gateway.url).with_resume(true);
    let (monitor, mut rx) = GatewayMonitor::new(config);
    monitor.start_monitoring("m1");

    let mut peer = gateway.next_peer().await;
    peer.expect_op(2).await;
    peer.hello(10_000).await;
    peer.expect_op(1).await;
    peer.dispatch(
        "READY",
        1,
        json!({"session_id": "sess-1", "resume_gateway_url": gateway.url}),
    )
    .await;
    peer.dispatch("MESSAGE_CREATE", 2, json!({"id": "m"})).await;
    collect_events(&mut rx, 2).await;
    peer.close(4009, "").await;

    // Resume instead of identify, carrying the last sequence
    let mut peer = gateway.next_peer().await;
    let resume = peer.expect_op(6).await;
    assert_eq!(resume["d"]["token"], TOKEN);
    assert_eq!(resume["d"]["session_id"], "sess-1");
    assert_eq!(resume["d"]["seq"], 2);

    peer.hello(10_000).await;
    assert_eq!(peer.expect_op(1).await["d"], 2);

    // An invalidated session forces a fresh identify next time
    peer.send_json(json!({"op": 9, "d": false})).await;
    peer.close(4000, "").await;

    let mut peer = gateway.next_peer().await;
    let identify = peer.expect_op(2).await;
    assert_eq!(identify["d"]["token"], TOKEN);

    monitor.stop_monitoring("m1").await;
}

/// Allowance for socket and scheduling jitter on the real clock
const JITTER: Duration = Duration::from_millis(100);

#[tokio::test]
async fn test_repeated_hello_keeps_one_event_per_tick() {
    let tick = Duration::from_secs(1);
    let mut gateway = MockGateway::spawn().await;
    let config = test_config(&gateway.url).with_dispatch_tick(tick);
    let (monitor, mut rx) = GatewayMonitor::new(config);
    monitor.start_monitoring("m1");

    let mut peer = gateway.next_peer().await;
    peer.expect_op(2).await;
    peer.dispatch("MESSAGE_CREATE", 1, json!({"id": "a"})).await;
    peer.dispatch("MESSAGE_CREATE", 2, json!({"id": "b"})).await;
    peer.hello(10_000).await;

    let (first_at, first) = next_event(&mut rx).await;
    assert_eq!(first.payload["id"], "a");

    tokio::time::sleep(Duration::from_millis(100)).await;
    peer.hello(10_000).await;
    // The heartbeat restarts on the new Hello
    peer.expect_op(1).await;

    let (second_at, second) = next_event(&mut rx).await;
    assert_eq!(second.payload["id"], "b");
    assert!(
        second_at - first_at >= tick - JITTER,
        "deliveries {:?} apart",
        second_at - first_at
    );

    monitor.stop_monitoring("m1").await;
}

#[tokio::test]
async fn test_fast_reconnect_keeps_one_event_per_tick() {
    let tick = Duration::from_secs(1);
    let mut gateway = MockGateway::spawn().await;
    // Reconnect delay (200ms) is shorter than the tick
    let config = test_config(&gateway.url).with_dispatch_tick(tick);
    let (monitor, mut rx) = GatewayMonitor::new(config);
    monitor.start_monitoring("m1");

    let mut peer = gateway.next_peer().await;
    peer.expect_op(2).await;
    peer.dispatch("MESSAGE_CREATE", 1, json!({"id": "a"})).await;
    peer.dispatch("MESSAGE_CREATE", 2, json!({"id": "b"})).await;
    peer.hello(10_000).await;

    let (first_at, first) = next_event(&mut rx).await;
    assert_eq!(first.payload["id"], "a");
    peer.close(4000, "").await;

    let mut peer = gateway.next_peer().await;
    peer.expect_op(2).await;
    peer.hello(10_000).await;

    // Left over from the first connection
    let (second_at, second) = next_event(&mut rx).await;
    assert_eq!(second.payload["id"], "b");
    assert!(
        second_at - first_at >= tick - JITTER,
        "deliveries {:?} apart",
        second_at - first_at
    );

    monitor.stop_monitoring("m1").await;
}
