// ============================
// crates/backend-lib/src/hub/features.rs
// ============================
//! In-meeting features: whiteboard, polls, breakout rooms, recording.
//!
//! All of this state is room-scoped and dies with the room.
use super::{Hub, PollState, RecordingState, WhiteboardState};
use crate::authz;
use crate::connections::ConnId;
use crate::error::HubError;
use huddle_common::{BreakoutAction, PollAction, RecordingAction, ServerMessage, WhiteboardAction};
use uuid::Uuid;

impl Hub {
    pub(super) fn whiteboard(
        &mut self,
        conn: ConnId,
        room_id: &str,
        action: WhiteboardAction,
    ) -> Result<(), HubError> {
        let sess = self.member_session(conn, room_id)?;
        let (role, user_id) = (sess.role, sess.user_id.clone());

        match action {
            WhiteboardAction::Open => {
                authz::require_host(role)?;
                self.whiteboards
                    .insert(room_id.to_string(), WhiteboardState::default());
                self.broadcast_room(room_id, &ServerMessage::WhiteboardOpened, None);
            },
            WhiteboardAction::Close => {
                authz::require_host(role)?;
                if self.whiteboards.remove(room_id).is_none() {
                    return Err(HubError::NotFound("whiteboard"));
                }
                self.broadcast_room(room_id, &ServerMessage::WhiteboardClosed, None);
            },
            // The author already rendered their own stroke locally, so it
            // echoes to everyone else only.
            WhiteboardAction::Draw { path } => {
                let board = self
                    .whiteboards
                    .get_mut(room_id)
                    .ok_or(HubError::NotFound("whiteboard"))?;
                board.strokes.push(path.clone());
                self.broadcast_room(
                    room_id,
                    &ServerMessage::WhiteboardStroke { user_id, path },
                    Some(conn),
                );
            },
            WhiteboardAction::Clear => {
                let board = self
                    .whiteboards
                    .get_mut(room_id)
                    .ok_or(HubError::NotFound("whiteboard"))?;
                board.strokes.clear();
                self.broadcast_room(room_id, &ServerMessage::WhiteboardCleared, None);
            },
        }
        Ok(())
    }

    pub(super) fn poll(
        &mut self,
        conn: ConnId,
        room_id: &str,
        action: PollAction,
    ) -> Result<(), HubError> {
        let sess = self.member_session(conn, room_id)?;
        let (role, user_id) = (sess.role, sess.user_id.clone());

        match action {
            PollAction::Create { question, options } => {
                authz::require_moderator(role)?;
                if options.len() < 2 {
                    return Err(HubError::Malformed(
                        "a poll needs at least two options".to_string(),
                    ));
                }
                let poll_id = Uuid::new_v4().to_string();
                self.polls.entry(room_id.to_string()).or_default().insert(
                    poll_id.clone(),
                    PollState {
                        question: question.clone(),
                        options: options.clone(),
                        responses: Default::default(),
                    },
                );
                self.broadcast_room(
                    room_id,
                    &ServerMessage::PollStarted {
                        poll_id,
                        question,
                        options,
                    },
                    None,
                );
            },
            PollAction::Respond {
                poll_id,
                option_index,
            } => {
                let poll = self
                    .polls
                    .get_mut(room_id)
                    .and_then(|polls| polls.get_mut(&poll_id))
                    .ok_or(HubError::NotFound("poll"))?;
                if option_index >= poll.options.len() {
                    return Err(HubError::Malformed("poll option out of range".to_string()));
                }
                // Re-voting replaces the previous choice.
                poll.responses.insert(user_id, option_index);
                let responses = poll.responses.len();
                self.broadcast_room(
                    room_id,
                    &ServerMessage::PollUpdated { poll_id, responses },
                    None,
                );
            },
            PollAction::End { poll_id } => {
                authz::require_moderator(role)?;
                let poll = self
                    .polls
                    .get_mut(room_id)
                    .and_then(|polls| polls.remove(&poll_id))
                    .ok_or(HubError::NotFound("poll"))?;
                let mut counts = vec![0u32; poll.options.len()];
                for &choice in poll.responses.values() {
                    counts[choice] += 1;
                }
                self.broadcast_room(
                    room_id,
                    &ServerMessage::PollEnded {
                        poll_id,
                        question: poll.question,
                        options: poll.options,
                        counts,
                    },
                    None,
                );
            },
        }
        Ok(())
    }

    pub(super) fn breakout_rooms(
        &mut self,
        conn: ConnId,
        room_id: &str,
        action: BreakoutAction,
    ) -> Result<(), HubError> {
        let role = self.member_session(conn, room_id)?.role;
        authz::require_host(role)?;

        match action {
            BreakoutAction::Create { rooms } => {
                self.breakouts.insert(room_id.to_string(), rooms.clone());
                self.broadcast_room(
                    room_id,
                    &ServerMessage::BreakoutRoomsUpdated { rooms },
                    None,
                );
            },
            BreakoutAction::Close => {
                if self.breakouts.remove(room_id).is_none() {
                    return Err(HubError::NotFound("breakout rooms"));
                }
                self.broadcast_room(room_id, &ServerMessage::BreakoutRoomsClosed, None);
            },
        }
        Ok(())
    }

    pub(super) fn recording(
        &mut self,
        conn: ConnId,
        room_id: &str,
        action: RecordingAction,
    ) -> Result<(), HubError> {
        let sess = self.member_session(conn, room_id)?;
        let (role, user_id) = (sess.role, sess.user_id.clone());
        authz::require_host(role)?;

        match action {
            RecordingAction::Start => {
                self.recordings
                    .insert(room_id.to_string(), RecordingState { by: user_id.clone() });
                self.broadcast_room(
                    room_id,
                    &ServerMessage::RecordingStatus {
                        active: true,
                        by: user_id,
                    },
                    None,
                );
            },
            RecordingAction::Stop => {
                let state = self
                    .recordings
                    .remove(room_id)
                    .ok_or(HubError::NotFound("recording"))?;
                self.broadcast_room(
                    room_id,
                    &ServerMessage::RecordingStatus {
                        active: false,
                        by: state.by,
                    },
                    None,
                );
            },
        }
        Ok(())
    }
}
