//! In-process mock gateway for session tests

#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use monitor_gateway::{
    Notification, NotificationReceiver, QueuedEvent, ReconnectPolicy, SessionConfig,
};
use serde_json::{json, Value};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

pub const TOKEN: &str = "test-token";

/// Upper bound for any single expectation
pub const WAIT: Duration = Duration::from_secs(5);

pub async fn within<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(WAIT, future)
        .await
        .expect("timed out waiting for the session")
}

/// Settings for a session against the mock: fast ticks, short fixed reconnect delay
pub fn test_config(url: &str) -> SessionConfig {
    SessionConfig::new(url, TOKEN)
        .with_dispatch_tick(Duration::from_millis(50))
        .with_reconnect(ReconnectPolicy::fixed(Duration::from_millis(200)))
}

/// Accepts gateway connections on a loopback port
pub struct MockGateway {
    pub url: String,
    peers: mpsc::UnboundedReceiver<GatewayPeer>,
}

impl MockGateway {
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, peers) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                if let Ok(ws) = accept_async(stream).await {
                    if tx.send(GatewayPeer { ws }).is_err() {
                        break;
                    }
                }
            }
        });

        Self {
            url: format!("ws://127.0.0.1:{}", addr.port()),
            peers,
        }
    }

    /// Wait for the next client connection
    pub async fn next_peer(&mut self) -> GatewayPeer {
        within(self.peers.recv()).await.expect("mock gateway stopped")
    }

    /// Wait up to `wait` for a connection that should not happen
    pub async fn try_next_peer(&mut self, wait: Duration) -> Option<GatewayPeer> {
        tokio::time::timeout(wait, self.peers.recv()).await.ok().flatten()
    }
}

/// Server side of one client connection
pub struct GatewayPeer {
    ws: WebSocketStream<TcpStream>,
}

impl GatewayPeer {
    pub async fn send_raw(&mut self, text: &str) {
        self.ws.send(Message::Text(text.to_string().into())).await.unwrap();
    }

    pub async fn send_json(&mut self, value: Value) {
        self.send_raw(&value.to_string()).await;
    }

    pub async fn hello(&mut self, interval_ms: u64) {
        self.send_json(json!({"op": 10, "d": {"heartbeat_interval": interval_ms}}))
            .await;
    }

    pub async fn dispatch(&mut self, event_type: &str, seq: u64, data: Value) {
        self.send_json(json!({"op": 0, "t": event_type, "s": seq, "d": data}))
            .await;
    }

    /// Next text frame from the client as JSON; `None` once the socket closes
    pub async fn recv_json(&mut self) -> Option<Value> {
        within(async {
            while let Some(message) = self.ws.next().await {
                match message {
                    Ok(Message::Text(text)) => return serde_json::from_str(&text).ok(),
                    Ok(Message::Close(_)) | Err(_) => return None,
                    Ok(_) => {}
                }
            }
            None
        })
        .await
    }

    /// Skip frames until one with the given op arrives
    pub async fn expect_op(&mut self, op: u64) -> Value {
        loop {
            let frame = self
                .recv_json()
                .await
                .unwrap_or_else(|| panic!("socket closed while waiting for op {op}"));
            if frame["op"] == op {
                return frame;
            }
        }
    }

    /// Collect text frames until the client closes the socket
    pub async fn drain_until_closed(&mut self) -> Vec<Value> {
        let mut frames = Vec::new();
        while let Some(frame) = self.recv_json().await {
            frames.push(frame);
        }
        frames
    }

    pub async fn close(&mut self, code: u16, reason: &str) {
        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: reason.to_string().into(),
        };
        let _ = self.ws.close(Some(frame)).await;
    }
}

/// Skip notifications until a status starting with `prefix` arrives
pub async fn expect_status(rx: &mut NotificationReceiver, prefix: &str) -> (String, String) {
    within(async {
        loop {
            match rx.recv().await.expect("notification channel closed") {
                Notification::Status { tag, message } if message.starts_with(prefix) => {
                    return (tag, message);
                }
                _ => {}
            }
        }
    })
    .await
}

/// Collect notifications until `count` events have been delivered
pub async fn collect_events(rx: &mut NotificationReceiver, count: usize) -> Vec<Notification> {
    within(async {
        let mut seen = Vec::new();
        let mut events = 0;
        while events < count {
            let notification = rx.recv().await.expect("notification channel closed");
            if matches!(notification, Notification::Event(_)) {
                events += 1;
            }
            seen.push(notification);
        }
        seen
    })
    .await
}

/// Wait for the next event notification and note when it arrived
pub async fn next_event(rx: &mut NotificationReceiver) -> (Instant, QueuedEvent) {
    within(async {
        loop {
            if let Notification::Event(event) =
                rx.recv().await.expect("notification channel closed")
            {
                return (Instant::now(), event);
            }
        }
    })
    .await
}
