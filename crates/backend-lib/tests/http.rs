// ===========================
// crates/backend-lib/tests/http.rs
// ===========================
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use huddle_backend_lib::{
    config::{Settings, TurnSettings},
    ws_router::create_router,
    AppState,
};
use serde_json::Value;
use tower::ServiceExt;

fn test_app(settings: Settings) -> axum::Router {
    create_router(AppState::new(settings))
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_status_endpoint() {
    let app = test_app(Settings::default());
    let (status, body) = get_json(app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["rooms"], 0);
    assert_eq!(body["connections"], 0);
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_turn_config_stun_only() {
    let app = test_app(Settings::default());
    let (status, body) = get_json(app, "/api/turn").await;

    assert_eq!(status, StatusCode::OK);
    let servers = body["iceServers"].as_array().unwrap();
    assert_eq!(servers.len(), 3);
    assert!(servers[0]["urls"].as_str().unwrap().starts_with("stun:"));
    assert!(servers[0].get("credential").is_none());
}

#[tokio::test]
async fn test_turn_config_with_relay() {
    let settings = Settings {
        turn: Some(TurnSettings {
            url: "turn:relay.example.com:3478".to_string(),
            username: "user".to_string(),
            credential: "secret".to_string(),
        }),
        ..Default::default()
    };
    let app = test_app(settings);
    let (status, body) = get_json(app, "/api/turn").await;

    assert_eq!(status, StatusCode::OK);
    let servers = body["iceServers"].as_array().unwrap();
    assert_eq!(servers.len(), 4);
    let relay = servers.last().unwrap();
    assert_eq!(relay["urls"], "turn:relay.example.com:3478");
    assert_eq!(relay["username"], "user");
    assert_eq!(relay["credential"], "secret");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = test_app(Settings::default());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_ws_route_rejects_plain_get() {
    // Without the upgrade handshake headers the route must refuse.
    let app = test_app(Settings::default());
    let response = app
        .oneshot(Request::builder().uri("/ws").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_ne!(response.status(), StatusCode::OK);
}
