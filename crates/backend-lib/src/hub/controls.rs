// ============================
// crates/backend-lib/src/hub/controls.rs
// ============================
//! Host directives, meeting-wide controls, engagement and media flags.
//!
//! Self-reported flags belong to the owning user; host-forced flags may
//! be overwritten by an authorized host/co-host at any time. Last write
//! wins, no versioning.
use super::Hub;
use crate::authz;
use crate::connections::ConnId;
use crate::error::HubError;
use huddle_common::{
    EngagementAction, HostAction, MediaAction, MeetingAction, Role, ServerMessage, ShareAction,
};

impl Hub {
    pub(super) fn host_control(
        &mut self,
        conn: ConnId,
        room_id: &str,
        target_user_id: &str,
        action: HostAction,
    ) -> Result<(), HubError> {
        let role = self.member_session(conn, room_id)?.role;
        authz::require_moderator(role)?;

        if let HostAction::Remove = action {
            let target = self
                .room(room_id)?
                .participants
                .get(target_user_id)
                .ok_or(HubError::NotFound("target participant"))?;
            let (target_conn, target_user) = (target.conn, target.user_id.clone());
            self.send_to_conn(
                target_conn,
                ServerMessage::RemovedFromRoom {
                    room_id: room_id.to_string(),
                },
            );
            self.leave_room(target_conn, room_id.to_string(), target_user);
            return Ok(());
        }

        let participant = self
            .rooms
            .get_mut(room_id)
            .ok_or(HubError::NotFound("room"))?
            .participants
            .get_mut(target_user_id)
            .ok_or(HubError::NotFound("target participant"))?;

        let msg = match action {
            HostAction::MuteAudio => {
                participant.is_audio_muted = true;
                participant.flags_update()
            },
            HostAction::UnmuteAudio => {
                participant.is_audio_muted = false;
                participant.flags_update()
            },
            HostAction::DisableVideo => {
                participant.is_video_enabled = false;
                participant.flags_update()
            },
            HostAction::EnableVideo => {
                participant.is_video_enabled = true;
                participant.flags_update()
            },
            HostAction::LowerHand => {
                participant.is_hand_raised = false;
                ServerMessage::HandLowered {
                    user_id: participant.user_id.clone(),
                }
            },
            HostAction::PromoteCoHost => {
                participant.role = Role::CoHost;
                let promoted_conn = participant.conn;
                let promoted_user = participant.user_id.clone();
                if let Some(sess) = self.sessions.get_mut(&promoted_conn) {
                    sess.role = Role::CoHost;
                }
                ServerMessage::RoleChanged {
                    user_id: promoted_user,
                    role: Role::CoHost,
                }
            },
            HostAction::Remove => unreachable!("handled above"),
        };

        self.broadcast_room(room_id, &msg, None);
        Ok(())
    }

    /// Meeting-wide controls are host-only.
    pub(super) fn meeting_control(
        &mut self,
        conn: ConnId,
        room_id: &str,
        action: MeetingAction,
    ) -> Result<(), HubError> {
        let role = self.member_session(conn, room_id)?.role;
        authz::require_host(role)?;

        match action {
            MeetingAction::Lock | MeetingAction::Unlock => {
                let locked = matches!(action, MeetingAction::Lock);
                let policy = self
                    .policies
                    .get_mut(room_id)
                    .ok_or(HubError::NotFound("policy"))?;
                policy.lock_meeting = locked;
                let policy = policy.clone();
                self.broadcast_room(room_id, &ServerMessage::PolicyUpdated { policy }, None);
            },
            MeetingAction::UpdatePolicy { policy } => {
                self.policies.insert(room_id.to_string(), policy.clone());
                self.broadcast_room(room_id, &ServerMessage::PolicyUpdated { policy }, None);
            },
            MeetingAction::MuteAll => {
                let mut updates = Vec::new();
                if let Some(room) = self.rooms.get_mut(room_id) {
                    for participant in room.participants.values_mut() {
                        if !participant.role.is_moderator() && !participant.is_audio_muted {
                            participant.is_audio_muted = true;
                            updates.push(participant.flags_update());
                        }
                    }
                }
                for msg in updates {
                    self.broadcast_room(room_id, &msg, None);
                }
            },
        }
        Ok(())
    }

    pub(super) fn engagement(
        &mut self,
        conn: ConnId,
        room_id: &str,
        action: EngagementAction,
    ) -> Result<(), HubError> {
        let sess = self.member_session(conn, room_id)?;
        let (role, user_id) = (sess.role, sess.user_id.clone());
        let policy = self.policy(room_id);

        match action {
            EngagementAction::RaiseHand => {
                if !policy.allow_raise_hand && !role.is_moderator() {
                    return Err(HubError::PolicyViolation("raise hand is disabled"));
                }
                self.set_own_flag(room_id, &user_id, |p| p.is_hand_raised = true)?;
                self.broadcast_room(room_id, &ServerMessage::HandRaised { user_id }, None);
            },
            EngagementAction::LowerHand => {
                self.set_own_flag(room_id, &user_id, |p| p.is_hand_raised = false)?;
                self.broadcast_room(room_id, &ServerMessage::HandLowered { user_id }, None);
            },
            EngagementAction::Reaction { emoji } => {
                if !policy.allow_reactions && !role.is_moderator() {
                    return Err(HubError::PolicyViolation("reactions are disabled"));
                }
                self.broadcast_room(room_id, &ServerMessage::Reaction { user_id, emoji }, None);
            },
            EngagementAction::LowerAllHands => {
                authz::require_host(role)?;
                if let Some(room) = self.rooms.get_mut(room_id) {
                    for participant in room.participants.values_mut() {
                        participant.is_hand_raised = false;
                    }
                }
                self.broadcast_room(room_id, &ServerMessage::AllHandsLowered, None);
            },
        }
        Ok(())
    }

    /// Self-owned media flags. Unmuting is policy-gated for participants.
    pub(super) fn media_state(
        &mut self,
        conn: ConnId,
        room_id: &str,
        action: MediaAction,
    ) -> Result<(), HubError> {
        let sess = self.member_session(conn, room_id)?;
        let (role, user_id) = (sess.role, sess.user_id.clone());

        if matches!(action, MediaAction::UnmuteAudio)
            && !self.policy(room_id).allow_participants_to_unmute
            && !role.is_moderator()
        {
            return Err(HubError::PolicyViolation("unmuting is disabled"));
        }

        let msg = {
            let participant = self.own_participant_mut(room_id, &user_id)?;
            match action {
                MediaAction::MuteAudio => participant.is_audio_muted = true,
                MediaAction::UnmuteAudio => participant.is_audio_muted = false,
                MediaAction::EnableVideo => participant.is_video_enabled = true,
                MediaAction::DisableVideo => participant.is_video_enabled = false,
            }
            participant.flags_update()
        };
        self.broadcast_room(room_id, &msg, None);
        Ok(())
    }

    pub(super) fn screen_share(
        &mut self,
        conn: ConnId,
        room_id: &str,
        action: ShareAction,
    ) -> Result<(), HubError> {
        let sess = self.member_session(conn, room_id)?;
        let (role, user_id) = (sess.role, sess.user_id.clone());

        match action {
            ShareAction::Start => {
                if !self.policy(room_id).allow_participants_to_share && !role.is_moderator() {
                    return Err(HubError::PolicyViolation("screen sharing is disabled"));
                }
                self.set_own_flag(room_id, &user_id, |p| p.is_screen_sharing = true)?;
                self.broadcast_room(
                    room_id,
                    &ServerMessage::ScreenShareStarted { user_id },
                    None,
                );
            },
            ShareAction::Stop => {
                self.set_own_flag(room_id, &user_id, |p| p.is_screen_sharing = false)?;
                self.broadcast_room(
                    room_id,
                    &ServerMessage::ScreenShareStopped { user_id },
                    None,
                );
            },
        }
        Ok(())
    }

    fn own_participant_mut(
        &mut self,
        room_id: &str,
        user_id: &str,
    ) -> Result<&mut super::Participant, HubError> {
        self.rooms
            .get_mut(room_id)
            .ok_or(HubError::NotFound("room"))?
            .participants
            .get_mut(user_id)
            .ok_or(HubError::NotFound("participant"))
    }

    fn set_own_flag(
        &mut self,
        room_id: &str,
        user_id: &str,
        set: impl FnOnce(&mut super::Participant),
    ) -> Result<(), HubError> {
        set(self.own_participant_mut(room_id, user_id)?);
        Ok(())
    }
}
