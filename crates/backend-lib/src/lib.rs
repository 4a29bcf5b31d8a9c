// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core backend-lib functionality for the Huddle signaling server.

pub mod authz;
pub mod config;
pub mod connections;
pub mod error;
pub mod handlers;
pub mod hub;
pub mod metrics;
pub mod ws_router;

use crate::config::Settings;
use crate::connections::ConnectionRegistry;
use crate::hub::HubHandle;
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Hub command channel
    pub hub: HubHandle,
    /// Live connection registry
    pub connections: ConnectionRegistry,
    /// Settings manager
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let connections = ConnectionRegistry::new();
        let hub = hub::spawn_hub(connections.clone());
        Self {
            hub,
            connections,
            settings: Arc::new(settings),
        }
    }
}
