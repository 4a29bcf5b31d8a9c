// ============================
// crates/backend-lib/src/connections.rs
// ============================
//! Transport-side registry of live connections.
//!
//! Maps a connection id to the outbound channel feeding its WebSocket
//! write half. The registry is shared between the per-connection socket
//! tasks (insert/remove) and the hub (delivery); delivery is
//! fire-and-forget with no acknowledgment or backpressure.
use huddle_common::ServerMessage;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

/// Ephemeral identifier for one live transport link.
pub type ConnId = Uuid;

#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    inner: Arc<DashMap<ConnId, mpsc::UnboundedSender<ServerMessage>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, conn: ConnId, tx: mpsc::UnboundedSender<ServerMessage>) {
        self.inner.insert(conn, tx);
    }

    pub fn remove(&self, conn: &ConnId) {
        self.inner.remove(conn);
    }

    pub fn contains(&self, conn: &ConnId) -> bool {
        self.inner.contains_key(conn)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Best-effort unicast. A missing or closed connection is logged and
    /// otherwise ignored; the lifecycle manager will reap it.
    pub fn send(&self, conn: ConnId, msg: ServerMessage) {
        match self.inner.get(&conn) {
            Some(tx) => {
                if tx.send(msg).is_err() {
                    warn!(%conn, "outbound channel closed, dropping message");
                }
            },
            None => warn!(%conn, "send to unknown connection"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_and_receive() {
        let registry = ConnectionRegistry::new();
        let conn = Uuid::new_v4();
        let (tx, mut rx) = mpsc::unbounded_channel();
        registry.insert(conn, tx);

        registry.send(conn, ServerMessage::AllHandsLowered);
        assert_eq!(rx.try_recv().unwrap(), ServerMessage::AllHandsLowered);
    }

    #[test]
    fn test_send_to_unknown_connection_is_a_noop() {
        let registry = ConnectionRegistry::new();
        registry.send(Uuid::new_v4(), ServerMessage::AllHandsLowered);
        assert!(registry.is_empty());
    }
}
