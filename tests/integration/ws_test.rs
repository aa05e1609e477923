//! Integration tests for the WebSocket presence and chat protocol.

mod helpers;

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use helpers::TestApp;

#[tokio::test]
async fn test_ws_route_requires_upgrade() {
    let app = TestApp::new();

    let response = app.request("GET", "/ws").await;

    assert!(
        response.status.is_client_error(),
        "Expected a 4xx for a plain GET, got {}",
        response.status
    );
}

#[tokio::test]
async fn test_announce_broadcasts_online_list_to_everyone() {
    let server = TestApp::new().spawn().await;

    let mut alice = server.online("alice").await;
    let mut bob = server.online("bob").await;

    let seen_by_alice = alice.next_of("online_user_list_changed").await;
    assert_eq!(seen_by_alice["user_ids"], json!(["alice", "bob"]));

    // an anonymous connection still hears presence changes
    let mut watcher = server.connect().await;
    bob.announce("bob").await;
    watcher.expect_silence(Duration::from_millis(200)).await;

    let carol = server.online("carol").await;
    let seen_by_watcher = watcher.next_of("online_user_list_changed").await;
    assert_eq!(seen_by_watcher["user_ids"], json!(["alice", "bob", "carol"]));

    carol.close().await;
}

#[tokio::test]
async fn test_chat_is_relayed_only_to_recipient() {
    let server = TestApp::new().spawn().await;

    let mut alice = server.online("alice").await;
    let mut bob = server.online("bob").await;
    let mut carol = server.online("carol").await;
    // drain the broadcasts caused by later arrivals
    alice.next_of("online_user_list_changed").await;
    alice.next_of("online_user_list_changed").await;
    bob.next_of("online_user_list_changed").await;

    alice.chat("alice", "bob", "is the room still free?").await;

    let incoming = bob.next_of("incoming_chat_message").await;
    assert_eq!(incoming["sender_id"], "alice");
    assert_eq!(incoming["text"], "is the room still free?");

    carol.expect_silence(Duration::from_millis(200)).await;
    alice.expect_silence(Duration::from_millis(50)).await;
}

#[tokio::test]
async fn test_chat_to_offline_user_is_dropped_silently() {
    let server = TestApp::new().spawn().await;

    let mut alice = server.online("alice").await;
    alice.chat("alice", "nobody", "hello?").await;

    alice.expect_silence(Duration::from_millis(200)).await;
    let metrics = server.app.state.realtime.metrics_snapshot();
    assert_eq!(metrics.relays_dropped, 1);
}

#[tokio::test]
async fn test_protocol_errors_are_reported_to_sender() {
    let server = TestApp::new().spawn().await;
    let mut client = server.connect().await;

    client.send_raw("{not json").await;
    let error = client.next_of("error").await;
    assert_eq!(error["code"], "INVALID_MESSAGE");

    client.chat("ghost", "bob", "hi").await;
    let error = client.next_of("error").await;
    assert_eq!(error["code"], "NOT_ANNOUNCED");

    client.announce("dave").await;
    client.next_of("online_user_list_changed").await;
    client.chat("mallory", "bob", "hi").await;
    let error = client.next_of("error").await;
    assert_eq!(error["code"], "SENDER_MISMATCH");

    client.announce("erin").await;
    let error = client.next_of("error").await;
    assert_eq!(error["code"], "ALREADY_ANNOUNCED");
}

#[tokio::test]
async fn test_disconnect_removes_user_and_broadcasts() {
    let server = TestApp::new().spawn().await;

    let mut alice = server.online("alice").await;
    let bob = server.online("bob").await;
    alice.next_of("online_user_list_changed").await;

    bob.close().await;

    let list = alice.next_of("online_user_list_changed").await;
    assert_eq!(list["user_ids"], json!(["alice"]));
    assert!(!server.app.state.realtime.online_users().contains(&"bob".into()));
}

#[tokio::test]
async fn test_reconnect_moves_identity_to_newest_connection() {
    let server = TestApp::new().spawn().await;

    let mut old_bob = server.online("bob").await;
    let mut new_bob = server.online("bob").await;
    assert!(old_bob.closed_by_server().await);

    let mut alice = server.online("alice").await;
    new_bob.next_of("online_user_list_changed").await;
    alice.chat("alice", "bob", "ping").await;

    let incoming = new_bob.next_of("incoming_chat_message").await;
    assert_eq!(incoming["text"], "ping");
    assert_eq!(server.app.state.realtime.online_users().len(), 2);
}

#[tokio::test]
async fn test_shutdown_closes_sockets_and_refuses_upgrades() {
    let server = TestApp::new().spawn().await;

    let mut alice = server.online("alice").await;
    server.app.state.realtime.shutdown().await.unwrap();

    assert!(alice.closed_by_server().await);
    assert!(server.app.state.realtime.online_users().is_empty());

    let refused = tokio_tungstenite::connect_async(server.ws_url()).await;
    match refused {
        Err(tokio_tungstenite::tungstenite::Error::Http(response)) => {
            assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        }
        other => panic!("Expected HTTP 503, got {:?}", other.map(|_| ())),
    }
}
