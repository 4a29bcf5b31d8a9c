// ============================
// crates/backend-lib/src/hub/waiting.rs
// ============================
//! Waiting-room admission queue.
//!
//! A queued requester has no participant record and receives no room
//! traffic until a host approves them. Approval replays the full
//! admission sequence; denial and disconnect both dequeue, denial with a
//! notification and disconnect silently.
use super::{Hub, WaitingEntry};
use crate::authz;
use crate::connections::ConnId;
use crate::error::HubError;
use crate::metrics as keys;
use huddle_common::{Role, RoomId, ServerMessage, UserId, WaitingAction};
use metrics::counter;
use tracing::debug;

impl Hub {
    pub(super) fn enqueue_waiting(
        &mut self,
        conn: ConnId,
        room_id: RoomId,
        user_id: UserId,
        user_name: String,
        requested_role: Role,
    ) {
        let queue = self.waiting.entry(room_id.clone()).or_default();
        queue.retain(|entry| entry.conn != conn && entry.user_id != user_id);
        queue.push(WaitingEntry {
            user_id: user_id.clone(),
            user_name: user_name.clone(),
            conn,
            requested_role,
        });
        counter!(keys::WAITING_QUEUED).increment(1);

        // Hosts and co-hosts of a live room get the knock.
        let request = ServerMessage::WaitingJoinRequest {
            room_id: room_id.clone(),
            user_id,
            user_name,
        };
        if let Some(room) = self.rooms.get(&room_id) {
            for participant in room.participants.values() {
                if participant.role.is_moderator() {
                    self.send_to_conn(participant.conn, request.clone());
                }
            }
        }

        self.send_to_conn(conn, ServerMessage::WaitingRoomPending { room_id });
    }

    /// Drop every queued request owned by this connection. Used on
    /// disconnect and on rejoin; no notification is sent.
    pub(super) fn remove_waiting_conn(&mut self, conn: ConnId) {
        self.waiting.retain(|room_id, queue| {
            let before = queue.len();
            queue.retain(|entry| entry.conn != conn);
            if queue.len() != before {
                debug!(%conn, room_id, "waiting request withdrawn");
            }
            !queue.is_empty()
        });
    }

    /// Host decision on a pending entry.
    pub(super) fn waiting_room(
        &mut self,
        conn: ConnId,
        room_id: &str,
        user_id: &str,
        action: WaitingAction,
    ) -> Result<(), HubError> {
        let role = self.member_session(conn, room_id)?.role;
        authz::require_host(role)?;

        let entry = {
            let queue = self
                .waiting
                .get_mut(room_id)
                .ok_or(HubError::NotFound("waiting queue"))?;
            let idx = queue
                .iter()
                .position(|entry| entry.user_id == user_id)
                .ok_or(HubError::NotFound("waiting entry"))?;
            let entry = queue.remove(idx);
            if queue.is_empty() {
                self.waiting.remove(room_id);
            }
            entry
        };

        match action {
            WaitingAction::Approve => {
                // The requester may have dropped between knock and approval.
                if self.connections.contains(&entry.conn) {
                    self.admit(
                        entry.conn,
                        room_id.to_string(),
                        entry.user_id,
                        entry.user_name,
                        entry.requested_role,
                    );
                } else {
                    debug!(room_id, user_id, "approved requester already gone");
                }
            },
            WaitingAction::Deny => {
                self.send_to_conn(
                    entry.conn,
                    ServerMessage::JoinDenied {
                        room_id: room_id.to_string(),
                    },
                );
            },
        }
        Ok(())
    }
}
