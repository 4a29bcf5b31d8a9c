// ============================
// crates/backend-lib/src/hub/mod.rs
// ============================
//! The session-and-signaling hub.
//!
//! All mutable state (sessions, rooms, presence, groups, policies,
//! waiting queues, feature stores) is owned by a single `Hub` value and
//! mutated from exactly one task, fed by an mpsc command queue. Each
//! inbound event is handled to completion before the next one, so every
//! handler runs as an atomic transaction against the stores and the
//! room-emptiness invariant cannot race.
//!
//! Handler implementations are split by concern:
//! `lifecycle` (join/leave/disconnect), `signaling` (offer/answer/
//! candidate/chat), `presence` (lobby, calls, groups), `controls`
//! (host and meeting directives), `features` (whiteboard/poll/breakout/
//! recording) and `waiting` (admission queue).

mod controls;
mod features;
mod lifecycle;
mod presence;
mod signaling;
mod waiting;


use crate::connections::{ConnId, ConnectionRegistry};
use crate::error::HubError;
use crate::metrics as keys;
use huddle_common::{
    BreakoutRoom, ClientMessage, GroupId, MeetingPolicy, ParticipantInfo, PollId, Role, RoomId,
    ServerMessage, UserId,
};
use metrics::gauge;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc;
use tracing::debug;

/// A connection's live session, created on room admission.
#[derive(Debug, Clone)]
pub struct UserSession {
    pub user_id: UserId,
    pub user_name: String,
    pub role: Role,
    pub room_id: RoomId,
}

/// Presence entry, independent of room membership.
#[derive(Debug, Clone)]
pub struct PresenceEntry {
    pub user_name: String,
    pub conn: ConnId,
    pub status: String,
}

/// Pre-room call group. Its id doubles as the room scope; the member set
/// mirrors room membership once the room is live.
#[derive(Debug, Clone)]
pub struct Group {
    pub group_name: String,
    pub creator_id: UserId,
    pub members: HashSet<UserId>,
}

#[derive(Debug, Clone)]
pub struct Participant {
    pub user_id: UserId,
    pub user_name: String,
    pub role: Role,
    pub conn: ConnId,
    pub is_audio_muted: bool,
    pub is_video_enabled: bool,
    pub is_hand_raised: bool,
    pub is_screen_sharing: bool,
}

impl Participant {
    fn info(&self) -> ParticipantInfo {
        ParticipantInfo {
            user_id: self.user_id.clone(),
            user_name: self.user_name.clone(),
            role: self.role,
            is_audio_muted: self.is_audio_muted,
            is_video_enabled: self.is_video_enabled,
            is_hand_raised: self.is_hand_raised,
            is_screen_sharing: self.is_screen_sharing,
        }
    }

    fn flags_update(&self) -> ServerMessage {
        ServerMessage::ParticipantUpdated {
            user_id: self.user_id.clone(),
            is_audio_muted: self.is_audio_muted,
            is_video_enabled: self.is_video_enabled,
            is_hand_raised: self.is_hand_raised,
            is_screen_sharing: self.is_screen_sharing,
        }
    }
}

/// A room exists iff its participant table is non-empty.
#[derive(Debug, Default)]
pub struct Room {
    pub participants: HashMap<UserId, Participant>,
}

#[derive(Debug, Clone)]
pub struct WaitingEntry {
    pub user_id: UserId,
    pub user_name: String,
    pub conn: ConnId,
    pub requested_role: Role,
}

#[derive(Debug, Default)]
pub struct WhiteboardState {
    pub strokes: Vec<Value>,
}

#[derive(Debug)]
pub struct PollState {
    pub question: String,
    pub options: Vec<String>,
    pub responses: HashMap<UserId, usize>,
}

#[derive(Debug)]
pub struct RecordingState {
    pub by: UserId,
}

/// Live counts for the status endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct HubStats {
    pub rooms: usize,
    pub participants: usize,
    pub online_users: usize,
    pub connections: usize,
}

pub struct Hub {
    connections: ConnectionRegistry,
    sessions: HashMap<ConnId, UserSession>,
    presence: HashMap<UserId, PresenceEntry>,
    groups: HashMap<GroupId, Group>,
    rooms: HashMap<RoomId, Room>,
    policies: HashMap<RoomId, MeetingPolicy>,
    waiting: HashMap<RoomId, Vec<WaitingEntry>>,
    whiteboards: HashMap<RoomId, WhiteboardState>,
    polls: HashMap<RoomId, HashMap<PollId, PollState>>,
    breakouts: HashMap<RoomId, Vec<BreakoutRoom>>,
    recordings: HashMap<RoomId, RecordingState>,
}

impl Hub {
    pub fn new(connections: ConnectionRegistry) -> Self {
        Hub {
            connections,
            sessions: HashMap::new(),
            presence: HashMap::new(),
            groups: HashMap::new(),
            rooms: HashMap::new(),
            policies: HashMap::new(),
            waiting: HashMap::new(),
            whiteboards: HashMap::new(),
            polls: HashMap::new(),
            breakouts: HashMap::new(),
            recordings: HashMap::new(),
        }
    }

    /// Entry point for one inbound event. Policy/authorization failures
    /// are reported back to the caller as an `error` event; stale
    /// references and malformed payloads are dropped with a diagnostic.
    pub fn dispatch(&mut self, conn: ConnId, msg: ClientMessage) {
        if let Err(err) = self.handle(conn, msg) {
            if err.is_user_visible() {
                self.connections.send(
                    conn,
                    ServerMessage::Error {
                        code: err.error_code().to_string(),
                        message: err.to_string(),
                    },
                );
            } else {
                debug!(%conn, error = %err, "event dropped");
            }
        }
    }

    fn handle(&mut self, conn: ConnId, msg: ClientMessage) -> Result<(), HubError> {
        match msg {
            ClientMessage::JoinRoom {
                room_id,
                user_id,
                user_name,
                role,
            } => self.join_room(conn, room_id, user_id, user_name, role),
            ClientMessage::LeaveRoom { room_id, user_id } => {
                self.leave_room(conn, room_id, user_id);
                Ok(())
            },
            ClientMessage::Offer {
                room_id,
                offer,
                target_id,
            } => self.route_offer(conn, &room_id, offer, target_id),
            ClientMessage::Answer { room_id, answer, to } => {
                self.route_answer(conn, &room_id, answer, to)
            },
            ClientMessage::IceCandidate {
                room_id,
                candidate,
                target_id,
            } => self.route_candidate(conn, &room_id, candidate, target_id),
            ClientMessage::ChatMessage {
                room_id,
                message,
                to_user_id,
            } => self.chat_message(conn, &room_id, message, to_user_id),
            ClientMessage::RegisterUser {
                user_id,
                user_name,
                status,
            } => self.register_user(conn, user_id, user_name, status),
            ClientMessage::UpdateStatus { user_id, status } => {
                self.update_status(conn, &user_id, status)
            },
            ClientMessage::InitiateCall {
                to_user_id,
                call_id,
                room_id,
            } => self.initiate_call(conn, &to_user_id, call_id, room_id),
            ClientMessage::AcceptCall {
                to_user_id,
                call_id,
            } => self.accept_call(conn, &to_user_id, call_id),
            ClientMessage::DeclineCall {
                to_user_id,
                call_id,
                reason,
            } => self.decline_call(conn, &to_user_id, call_id, reason),
            ClientMessage::CreateGroup {
                group_id,
                group_name,
                creator_id,
            } => self.create_group(conn, group_id, group_name, creator_id),
            ClientMessage::HostControl {
                room_id,
                target_user_id,
                action,
            } => self.host_control(conn, &room_id, &target_user_id, action),
            ClientMessage::MeetingControl { room_id, action } => {
                self.meeting_control(conn, &room_id, action)
            },
            ClientMessage::Engagement { room_id, action } => {
                self.engagement(conn, &room_id, action)
            },
            ClientMessage::MediaState { room_id, action } => {
                self.media_state(conn, &room_id, action)
            },
            ClientMessage::ScreenShare { room_id, action } => {
                self.screen_share(conn, &room_id, action)
            },
            ClientMessage::Whiteboard { room_id, action } => {
                self.whiteboard(conn, &room_id, action)
            },
            ClientMessage::Poll { room_id, action } => self.poll(conn, &room_id, action),
            ClientMessage::BreakoutRooms { room_id, action } => {
                self.breakout_rooms(conn, &room_id, action)
            },
            ClientMessage::Recording { room_id, action } => {
                self.recording(conn, &room_id, action)
            },
            ClientMessage::WaitingRoom {
                room_id,
                user_id,
                action,
            } => self.waiting_room(conn, &room_id, &user_id, action),
        }
    }

    pub fn stats(&self) -> HubStats {
        HubStats {
            rooms: self.rooms.len(),
            participants: self.rooms.values().map(|r| r.participants.len()).sum(),
            online_users: self.presence.len(),
            connections: self.connections.len(),
        }
    }

    // ---- shared lookups ------------------------------------------------

    /// Resolve the sender's session, re-validated per event; membership may
    /// have changed since the triggering event was enqueued.
    fn session(&self, conn: ConnId) -> Result<&UserSession, HubError> {
        self.sessions.get(&conn).ok_or(HubError::NotFound("session"))
    }

    /// Resolve the sender's session and check it is bound to `room_id`.
    fn member_session(&self, conn: ConnId, room_id: &str) -> Result<&UserSession, HubError> {
        let sess = self.session(conn)?;
        if sess.room_id != room_id {
            return Err(HubError::NotFound("room membership"));
        }
        Ok(sess)
    }

    fn room(&self, room_id: &str) -> Result<&Room, HubError> {
        self.rooms.get(room_id).ok_or(HubError::NotFound("room"))
    }

    fn policy(&self, room_id: &str) -> MeetingPolicy {
        self.policies.get(room_id).cloned().unwrap_or_default()
    }

    // ---- delivery helpers ----------------------------------------------

    fn send_to_conn(&self, conn: ConnId, msg: ServerMessage) {
        self.connections.send(conn, msg);
    }

    /// Broadcast to every participant of a room, optionally excluding one
    /// connection (the usual "everyone else" addressing).
    fn broadcast_room(&self, room_id: &str, msg: &ServerMessage, except: Option<ConnId>) {
        let Some(room) = self.rooms.get(room_id) else {
            return;
        };
        for participant in room.participants.values() {
            if Some(participant.conn) == except {
                continue;
            }
            self.connections.send(participant.conn, msg.clone());
        }
    }

    /// Send to every presence subscriber (the lobby).
    fn broadcast_presence(&self, msg: &ServerMessage, except: Option<ConnId>) {
        for entry in self.presence.values() {
            if Some(entry.conn) == except {
                continue;
            }
            self.connections.send(entry.conn, msg.clone());
        }
    }

    fn record_room_gauges(&self) {
        gauge!(keys::ROOM_ACTIVE).set(self.rooms.len() as f64);
        gauge!(keys::WS_ACTIVE).set(self.connections.len() as f64);
    }
}

/// Message sent *into* the hub task.
#[derive(Debug)]
pub enum HubCommand {
    Inbound {
        conn: ConnId,
        msg: ClientMessage,
    },
    Disconnected {
        conn: ConnId,
    },
    Stats {
        resp_tx: mpsc::UnboundedSender<HubStats>,
    },
}

/// Handle that other components keep: the hub command channel.
#[derive(Clone)]
pub struct HubHandle {
    cmd_tx: mpsc::UnboundedSender<HubCommand>,
}

impl HubHandle {
    pub fn inbound(&self, conn: ConnId, msg: ClientMessage) {
        let _ = self.cmd_tx.send(HubCommand::Inbound { conn, msg });
    }

    /// Explicit cancellation signal carrying only the connection id; the
    /// hub treats it like a user-initiated leave for cleanup purposes.
    pub fn disconnected(&self, conn: ConnId) {
        let _ = self.cmd_tx.send(HubCommand::Disconnected { conn });
    }

    pub async fn stats(&self) -> HubStats {
        let (resp_tx, mut resp_rx) = mpsc::unbounded_channel();
        if self.cmd_tx.send(HubCommand::Stats { resp_tx }).is_err() {
            return HubStats::default();
        }
        resp_rx.recv().await.unwrap_or_default()
    }
}

/// Spawn the hub task and return its handle.
pub fn spawn_hub(connections: ConnectionRegistry) -> HubHandle {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let hub = Hub::new(connections);
    tokio::spawn(hub.run(cmd_rx));
    HubHandle { cmd_tx }
}

impl Hub {
    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<HubCommand>) {
        while let Some(cmd) = rx.recv().await {
            match cmd {
                HubCommand::Inbound { conn, msg } => self.dispatch(conn, msg),
                HubCommand::Disconnected { conn } => self.on_disconnect(conn),
                HubCommand::Stats { resp_tx } => {
                    let _ = resp_tx.send(self.stats());
                },
            }
        }
    }
}
