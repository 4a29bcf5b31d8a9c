// ============================
// crates/backend-lib/src/ws_router.rs
// ============================
//! HTTP router and WebSocket connection handling.
//!
//! Each accepted socket gets a fresh connection id and an outbound
//! channel registered with the [`ConnectionRegistry`]. The read half
//! parses client events and forwards them to the hub; the write half
//! drains the outbound channel. The hub never touches a socket directly.
use crate::connections::ConnId;
use crate::handlers;
use crate::metrics as keys;
use crate::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::Method,
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use huddle_common::{ClientMessage, ServerMessage};
use metrics::counter;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Build the application router: status, TURN config, WebSocket upgrade.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::status))
        .route("/api/turn", get(handlers::turn_config))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: AppState) {
    let conn: ConnId = Uuid::new_v4();
    counter!(keys::WS_CONNECTIONS).increment(1);
    info!(%conn, "websocket connected");

    let (mut sink, mut stream) = socket.split();

    // Outbound path: the hub (or this task) pushes ServerMessages into the
    // registry channel; this task serializes them onto the socket.
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.connections.insert(conn, tx.clone());

    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(err) => {
                    warn!(%err, "failed to serialize outbound message");
                    continue;
                },
            };
            if sink.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // Inbound path: parse and forward to the hub. A parse failure is
    // reported to this client only and does not reach the hub.
    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(msg) => state.hub.inbound(conn, msg),
                Err(err) => {
                    debug!(%conn, %err, "unparseable client message");
                    let _ = tx.send(ServerMessage::Error {
                        code: "MALFORMED_REQUEST".to_string(),
                        message: format!("malformed request: {err}"),
                    });
                },
            },
            Message::Close(_) => break,
            // Pings are answered by axum; binary frames are not part of
            // the protocol.
            _ => {},
        }
    }

    // Cleanup order matters: the hub must observe the disconnect while
    // the registry entry may still exist, then the entry goes away.
    state.hub.disconnected(conn);
    state.connections.remove(&conn);
    send_task.abort();
    info!(%conn, "websocket disconnected");
}
