// ============================
// crates/backend-lib/src/handlers.rs
// ============================
//! Plain HTTP handlers: liveness/status and ICE server configuration.
use crate::AppState;
use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};

/// `GET /` - service status and live counts.
pub async fn status(State(state): State<AppState>) -> Json<Value> {
    let stats = state.hub.stats().await;
    Json(json!({
        "status": "ok",
        "service": "huddle-signaling",
        "version": env!("CARGO_PKG_VERSION"),
        "rooms": stats.rooms,
        "participants": stats.participants,
        "onlineUsers": stats.online_users,
        "connections": stats.connections,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// `GET /api/turn` - ICE server list for the browser's RTCPeerConnection.
pub async fn turn_config(State(state): State<AppState>) -> Json<Value> {
    let mut ice_servers: Vec<Value> = state
        .settings
        .stun_servers
        .iter()
        .map(|url| json!({ "urls": url }))
        .collect();

    if let Some(turn) = &state.settings.turn {
        ice_servers.push(json!({
            "urls": turn.url,
            "username": turn.username,
            "credential": turn.credential,
        }));
    }

    Json(json!({ "iceServers": ice_servers }))
}
