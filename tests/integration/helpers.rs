//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tower::ServiceExt;

use roomie_api::{AppState, build_router};
use roomie_core::config::AppConfig;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state, for inspecting the engine directly
    pub state: AppState,
}

impl TestApp {
    /// Create a new test application with default configuration
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Create a new test application
    pub fn with_config(config: AppConfig) -> Self {
        let state = AppState::new(config);
        Self {
            router: build_router(state.clone()),
            state,
        }
    }

    /// Send a request through the router
    pub async fn request(&self, method: &str, path: &str) -> TestResponse {
        let req = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    /// Serve the router on an ephemeral port
    pub async fn spawn(self) -> TestServer {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("No local address");
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server failed");
        });
        TestServer {
            addr,
            app: self,
        }
    }
}

/// Test response
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// A router served over real TCP
pub struct TestServer {
    pub addr: SocketAddr,
    pub app: TestApp,
}

impl TestServer {
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Open a WebSocket client
    pub async fn connect(&self) -> WsClient {
        let (socket, _) = connect_async(self.ws_url())
            .await
            .expect("WebSocket handshake failed");
        let (tx, rx) = socket.split();
        WsClient { tx, rx }
    }

    /// Open a client and announce `user_id`, waiting for the resulting list
    pub async fn online(&self, user_id: &str) -> WsClient {
        let mut client = self.connect().await;
        client.announce(user_id).await;
        let list = client.next_of("online_user_list_changed").await;
        assert!(
            list["user_ids"]
                .as_array()
                .is_some_and(|ids| ids.iter().any(|id| id == user_id)),
            "{user_id} missing from {list}"
        );
        client
    }
}

/// Test WebSocket client speaking the JSON protocol
pub struct WsClient {
    tx: SplitSink<Socket, Message>,
    rx: SplitStream<Socket>,
}

impl WsClient {
    pub async fn send_json(&mut self, value: Value) {
        self.tx
            .send(Message::text(value.to_string()))
            .await
            .expect("Failed to send frame");
    }

    pub async fn send_raw(&mut self, text: &str) {
        self.tx
            .send(Message::text(text.to_string()))
            .await
            .expect("Failed to send frame");
    }

    pub async fn announce(&mut self, user_id: &str) {
        self.send_json(json!({ "type": "announce_identity", "user_id": user_id }))
            .await;
    }

    pub async fn chat(&mut self, from: &str, to: &str, text: &str) {
        self.send_json(json!({
            "type": "send_chat_message",
            "sender_id": from,
            "receiver_id": to,
            "text": text,
        }))
        .await;
    }

    /// Next JSON event other than a ping, or `None` when the socket closes
    pub async fn next_event(&mut self) -> Option<Value> {
        loop {
            let next = tokio::time::timeout(Duration::from_secs(5), self.rx.next())
                .await
                .expect("Timed out waiting for a frame");
            match next {
                Some(Ok(Message::Text(text))) => {
                    let value: Value =
                        serde_json::from_str(text.as_str()).expect("Server sent invalid JSON");
                    if value["type"] != "ping" {
                        return Some(value);
                    }
                }
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return None,
                Some(Ok(_)) => {}
            }
        }
    }

    /// Next event of the given type, skipping others
    pub async fn next_of(&mut self, kind: &str) -> Value {
        loop {
            let event = self
                .next_event()
                .await
                .unwrap_or_else(|| panic!("Socket closed while waiting for {kind}"));
            if event["type"] == kind {
                return event;
            }
        }
    }

    /// Assert nothing but pings arrives within `wait`
    pub async fn expect_silence(&mut self, wait: Duration) {
        if let Ok(Some(Ok(Message::Text(text)))) = tokio::time::timeout(wait, self.rx.next()).await {
            let value: Value = serde_json::from_str(text.as_str()).unwrap_or(Value::Null);
            assert_eq!(value["type"], "ping", "Unexpected frame: {value}");
        }
    }

    /// Whether the server closes the socket within a few seconds
    pub async fn closed_by_server(&mut self) -> bool {
        loop {
            let next = tokio::time::timeout(Duration::from_secs(5), self.rx.next()).await;
            match next {
                Err(_) => return false,
                Ok(Some(Ok(Message::Close(_)))) | Ok(None) | Ok(Some(Err(_))) => return true,
                Ok(Some(Ok(_))) => {}
            }
        }
    }

    pub async fn close(mut self) {
        let _ = self.tx.send(Message::Close(None)).await;
        let _ = self.tx.close().await;
    }
}
