// ============================
// crates/backend-lib/src/hub/signaling.rs
// ============================
//! Signal router: offer/answer/candidate negotiation payloads and chat.
//!
//! Payloads are opaque blobs; the router tags them with the sender's
//! user id and forwards them unchanged. Targeted signals unicast to one
//! participant; untargeted ones fall back to a room-mesh broadcast.
use super::Hub;
use crate::connections::ConnId;
use crate::error::HubError;
use crate::metrics as keys;
use chrono::Utc;
use huddle_common::{ServerMessage, UserId};
use metrics::counter;
use serde_json::Value;
use tracing::debug;

impl Hub {
    pub(super) fn route_offer(
        &mut self,
        conn: ConnId,
        room_id: &str,
        offer: Value,
        target_id: Option<UserId>,
    ) -> Result<(), HubError> {
        self.route_signal(conn, room_id, target_id, |from| ServerMessage::Offer {
            from,
            offer: offer.clone(),
        })
    }

    /// An answer is logically always a reply to a specific offerer; an
    /// untargeted answer is a caller error and is dropped rather than
    /// broadcast, to avoid silent mis-delivery loops.
    pub(super) fn route_answer(
        &mut self,
        conn: ConnId,
        room_id: &str,
        answer: Value,
        to: Option<UserId>,
    ) -> Result<(), HubError> {
        let Some(to) = to else {
            return Err(HubError::Malformed("untargeted answer".to_string()));
        };
        self.route_signal(conn, room_id, Some(to), |from| ServerMessage::Answer {
            from,
            answer: answer.clone(),
        })
    }

    /// Candidates without a target broadcast to the whole room, for
    /// resilience under mesh topology.
    pub(super) fn route_candidate(
        &mut self,
        conn: ConnId,
        room_id: &str,
        candidate: Value,
        target_id: Option<UserId>,
    ) -> Result<(), HubError> {
        self.route_signal(conn, room_id, target_id, |from| {
            ServerMessage::IceCandidate {
                from,
                candidate: candidate.clone(),
            }
        })
    }

    fn route_signal(
        &self,
        conn: ConnId,
        room_id: &str,
        target: Option<UserId>,
        make: impl Fn(UserId) -> ServerMessage,
    ) -> Result<(), HubError> {
        // Sender state already gone: a disconnect race, drop silently.
        let Ok(sess) = self.member_session(conn, room_id) else {
            debug!(%conn, room_id, "signal from unknown sender dropped");
            return Ok(());
        };
        let from = sess.user_id.clone();

        match target {
            Some(target_id) => {
                let participant = self
                    .room(room_id)?
                    .participants
                    .get(&target_id)
                    .ok_or(HubError::NotFound("target participant"))?;
                self.send_to_conn(participant.conn, make(from));
            },
            None => self.broadcast_room(room_id, &make(from), Some(conn)),
        }
        counter!(keys::SIGNALS_ROUTED).increment(1);
        Ok(())
    }

    /// Room chat broadcasts to everyone including the sender; a private
    /// message goes to the target and echoes back to the sender.
    pub(super) fn chat_message(
        &mut self,
        conn: ConnId,
        room_id: &str,
        message: String,
        to_user_id: Option<UserId>,
    ) -> Result<(), HubError> {
        let sess = self.member_session(conn, room_id)?;
        let policy = self.policy(room_id);
        let private = to_user_id.is_some();

        if private {
            if !policy.allow_private_chat && !sess.role.is_moderator() {
                return Err(HubError::PolicyViolation("private chat is disabled"));
            }
        } else if !policy.allow_chat && !sess.role.is_moderator() {
            return Err(HubError::PolicyViolation("chat is disabled"));
        }

        let msg = ServerMessage::NewMessage {
            user_id: sess.user_id.clone(),
            user_name: sess.user_name.clone(),
            message,
            private,
            timestamp: Utc::now().to_rfc3339(),
        };

        match to_user_id {
            Some(target_id) => {
                let target_conn = self
                    .room(room_id)?
                    .participants
                    .get(&target_id)
                    .ok_or(HubError::NotFound("target participant"))?
                    .conn;
                self.send_to_conn(target_conn, msg.clone());
                self.send_to_conn(conn, msg);
            },
            None => self.broadcast_room(room_id, &msg, None),
        }
        counter!(keys::CHAT_MESSAGES).increment(1);
        Ok(())
    }
}
