//! Integration tests for the HTTP health and presence endpoints.

mod helpers;

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use roomie_core::config::{AnnouncePolicy, AppConfig};

use helpers::TestApp;

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "ok");
    assert_eq!(response.body["data"]["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/profiles").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_presence_endpoints_follow_live_connections() {
    let server = TestApp::new().spawn().await;

    let response = server.app.request("GET", "/api/presence/online").await;
    assert_eq!(response.body["data"]["count"], 0);

    let mut lurker = server.connect().await;
    let mut zoe = server.online("zoe").await;
    let _adam = server.online("adam").await;
    zoe.next_of("online_user_list_changed").await;
    let heard = loop {
        let list = lurker.next_of("online_user_list_changed").await;
        if list["user_ids"].as_array().is_some_and(|ids| ids.len() == 2) {
            break list;
        }
    };
    assert_eq!(heard["user_ids"], json!(["adam", "zoe"]));

    let response = server.app.request("GET", "/api/presence/online").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["user_ids"], json!(["adam", "zoe"]));
    assert_eq!(response.body["data"]["count"], 2);

    let response = server.app.request("GET", "/api/presence/zoe").await;
    assert_eq!(response.body["data"]["online"], true);

    let response = server.app.request("GET", "/api/health/detailed").await;
    assert_eq!(response.body["data"]["online_users"], 2);
    assert_eq!(response.body["data"]["ws_connections"], 3);
    assert_eq!(response.body["data"]["metrics"]["announces"], 2);

    zoe.close().await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    let response = server.app.request("GET", "/api/presence/zoe").await;
    assert_eq!(response.body["data"]["online"], false);
}

#[tokio::test]
async fn test_first_wins_keeps_existing_connection() {
    let mut config = AppConfig::default();
    config.realtime.announce_policy = AnnouncePolicy::FirstWins;
    let server = TestApp::with_config(config).spawn().await;

    let mut first = server.online("bob").await;
    let mut second = server.connect().await;
    second.announce("bob").await;
    second.expect_silence(Duration::from_millis(200)).await;

    let mut alice = server.online("alice").await;
    first.next_of("online_user_list_changed").await;
    alice.chat("alice", "bob", "which one?").await;

    let incoming = first.next_of("incoming_chat_message").await;
    assert_eq!(incoming["text"], "which one?");
    second.next_of("online_user_list_changed").await;
    second.expect_silence(Duration::from_millis(200)).await;
}

#[tokio::test]
async fn test_cors_preflight_allows_configured_origin() {
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/presence/online")
                .header("Origin", "http://localhost:5173")
                .header("Access-Control-Request-Method", "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:5173")
    );
}
