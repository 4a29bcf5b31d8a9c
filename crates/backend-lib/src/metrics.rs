// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const WS_CONNECTIONS: &str = "ws.connections";
pub const WS_ACTIVE: &str = "ws.active";
pub const ROOM_CREATED: &str = "room.created";
pub const ROOM_DELETED: &str = "room.deleted";
pub const ROOM_ACTIVE: &str = "room.active";
pub const SIGNALS_ROUTED: &str = "signal.routed";
pub const CHAT_MESSAGES: &str = "chat.messages";
pub const WAITING_QUEUED: &str = "waiting.queued";
