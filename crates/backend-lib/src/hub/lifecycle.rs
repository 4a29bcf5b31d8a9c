// ============================
// crates/backend-lib/src/hub/lifecycle.rs
// ============================
//! Join/leave/disconnect protocol.
//!
//! This is the single place that maintains the emptiness invariant: a
//! room exists iff its participant table is non-empty, and deleting the
//! room cascades to every room-scoped store.
use super::{Hub, Participant, Room, UserSession};
use crate::connections::ConnId;
use crate::error::HubError;
use crate::metrics as keys;
use huddle_common::{Role, RoomId, ServerMessage, UserId};
use metrics::counter;
use tracing::info;

impl Hub {
    /// Join protocol, in order: detach from any current room, evaluate
    /// the lock, gate through the waiting room, or admit immediately.
    pub(super) fn join_room(
        &mut self,
        conn: ConnId,
        room_id: RoomId,
        user_id: UserId,
        user_name: String,
        requested_role: Role,
    ) -> Result<(), HubError> {
        // A connection belongs to at most one room at a time.
        if let Some(sess) = self.sessions.get(&conn).cloned() {
            self.leave_room(conn, sess.room_id, sess.user_id);
        }
        // A rejoin supersedes any admission request still queued.
        self.remove_waiting_conn(conn);

        let policy = self.policy(&room_id);
        if policy.lock_meeting && requested_role != Role::Host {
            return Err(HubError::MeetingLocked);
        }
        if policy.enable_waiting_room && requested_role != Role::Host {
            self.enqueue_waiting(conn, room_id, user_id, user_name, requested_role);
            return Ok(());
        }

        self.admit(conn, room_id, user_id, user_name, requested_role);
        Ok(())
    }

    /// Full admission sequence (§ join step 4), shared with waiting-room
    /// approval: create/merge the room, insert the participant record,
    /// register the session, mirror the group roster, announce the join
    /// and reply with the current roster plus policy.
    pub(super) fn admit(
        &mut self,
        conn: ConnId,
        room_id: RoomId,
        user_id: UserId,
        user_name: String,
        role: Role,
    ) {
        if !self.rooms.contains_key(&room_id) {
            self.rooms.insert(room_id.clone(), Room::default());
            // Policy may already exist if the room was seeded by a group.
            self.policies.entry(room_id.clone()).or_default();
            counter!(keys::ROOM_CREATED).increment(1);
            info!(%room_id, "room created");
        }

        let participant = Participant {
            user_id: user_id.clone(),
            user_name: user_name.clone(),
            role,
            conn,
            is_audio_muted: false,
            is_video_enabled: true,
            is_hand_raised: false,
            is_screen_sharing: false,
        };

        // Re-keying a user to a new connection must not leave the old
        // connection's session behind.
        let displaced = self
            .rooms
            .get_mut(&room_id)
            .and_then(|room| room.participants.insert(user_id.clone(), participant))
            .map(|old| old.conn)
            .filter(|old_conn| *old_conn != conn);
        if let Some(old_conn) = displaced {
            self.sessions.remove(&old_conn);
        }

        self.sessions.insert(
            conn,
            UserSession {
                user_id: user_id.clone(),
                user_name: user_name.clone(),
                role,
                room_id: room_id.clone(),
            },
        );

        if let Some(group) = self.groups.get_mut(&room_id) {
            if group.members.insert(user_id.clone()) {
                self.notify_group_roster(&room_id);
            }
        }

        self.broadcast_room(
            &room_id,
            &ServerMessage::UserJoined {
                user_id: user_id.clone(),
                user_name,
                role,
            },
            Some(conn),
        );

        let users = self
            .rooms
            .get(&room_id)
            .map(|room| {
                room.participants
                    .values()
                    .filter(|p| p.user_id != user_id)
                    .map(Participant::info)
                    .collect()
            })
            .unwrap_or_default();
        self.send_to_conn(
            conn,
            ServerMessage::RoomUsers {
                users,
                policy: self.policy(&room_id),
            },
        );
        self.record_room_gauges();
    }

    /// Leave protocol. Idempotent: a stale or repeated leave is a no-op,
    /// and a leave from a connection that has been re-keyed away does not
    /// evict the user's current connection.
    pub(super) fn leave_room(&mut self, conn: ConnId, room_id: RoomId, user_id: UserId) {
        let is_member = self
            .rooms
            .get(&room_id)
            .and_then(|room| room.participants.get(&user_id))
            .is_some_and(|p| p.conn == conn);
        if !is_member {
            let session_matches = self
                .sessions
                .get(&conn)
                .is_some_and(|s| s.room_id == room_id && s.user_id == user_id);
            if session_matches {
                self.sessions.remove(&conn);
            }
            return;
        }

        self.broadcast_room(
            &room_id,
            &ServerMessage::UserLeft {
                user_id: user_id.clone(),
            },
            Some(conn),
        );

        let mut now_empty = false;
        if let Some(room) = self.rooms.get_mut(&room_id) {
            room.participants.remove(&user_id);
            now_empty = room.participants.is_empty();
        }

        if now_empty {
            self.delete_room(&room_id);
        } else if let Some(group) = self.groups.get_mut(&room_id) {
            if group.members.remove(&user_id) {
                self.notify_group_roster(&room_id);
            }
        }

        self.sessions.remove(&conn);
        self.record_room_gauges();
    }

    /// Mandatory cascade: no room-scoped state may outlive the room.
    fn delete_room(&mut self, room_id: &str) {
        self.rooms.remove(room_id);
        self.policies.remove(room_id);
        self.waiting.remove(room_id);
        self.whiteboards.remove(room_id);
        self.polls.remove(room_id);
        self.breakouts.remove(room_id);
        self.recordings.remove(room_id);
        self.groups.remove(room_id);
        counter!(keys::ROOM_DELETED).increment(1);
        info!(%room_id, "room empty, deleted");
    }

    /// Transport-reported disconnect. Runs the same cleanup as an
    /// explicit leave, plus waiting-queue and presence eviction. Must
    /// complete unconditionally.
    pub(super) fn on_disconnect(&mut self, conn: ConnId) {
        // Implicit deny, no notification.
        self.remove_waiting_conn(conn);

        if let Some(sess) = self.sessions.get(&conn).cloned() {
            self.leave_room(conn, sess.room_id, sess.user_id);
        }

        let owned: Vec<UserId> = self
            .presence
            .iter()
            .filter(|(_, entry)| entry.conn == conn)
            .map(|(user_id, _)| user_id.clone())
            .collect();
        for user_id in owned {
            self.presence.remove(&user_id);
            self.broadcast_presence(&ServerMessage::UserOffline { user_id }, None);
        }

        self.connections.remove(&conn);
        self.record_room_gauges();
    }
}
