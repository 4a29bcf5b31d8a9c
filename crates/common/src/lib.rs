// ================
// crates/common/src/lib.rs
// ================
//! Common types and structures
//! used for communication between Huddle clients and the signaling server.
//! This module defines the WebSocket protocol messages and supporting types.
//!
//! Event names on the wire are kebab-case (`join-room`, `ice-candidate`, ...)
//! and payload fields are camelCase, matching the browser clients.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type RoomId = String;
pub type UserId = String;
pub type GroupId = String;
pub type PollId = String;

/// Role a user holds within a room.
///
/// `Host` controls the meeting as a whole; `CoHost` may issue
/// participant-level directives; `Participant` owns only their own state.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Host,
    CoHost,
    Participant,
}

impl Role {
    /// Hosts and co-hosts may act on other participants.
    pub fn is_moderator(self) -> bool {
        matches!(self, Role::Host | Role::CoHost)
    }
}

/// Per-room policy flags. Set at room (or group) creation, mutated only by
/// the host via `meeting-control`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MeetingPolicy {
    pub lock_meeting: bool,
    pub enable_waiting_room: bool,
    pub allow_chat: bool,
    pub allow_private_chat: bool,
    pub allow_participants_to_unmute: bool,
    pub allow_participants_to_share: bool,
    pub allow_raise_hand: bool,
    pub allow_reactions: bool,
}

impl Default for MeetingPolicy {
    fn default() -> Self {
        Self {
            lock_meeting: false,
            enable_waiting_room: false,
            allow_chat: true,
            allow_private_chat: true,
            allow_participants_to_unmute: true,
            allow_participants_to_share: true,
            allow_raise_hand: true,
            allow_reactions: true,
        }
    }
}

/// A participant's public record within a room, including the ephemeral
/// media/UI flags carried in `room-users` and `participant-updated`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantInfo {
    pub user_id: UserId,
    pub user_name: String,
    pub role: Role,
    pub is_audio_muted: bool,
    pub is_video_enabled: bool,
    pub is_hand_raised: bool,
    pub is_screen_sharing: bool,
}

/// A user's presence record, independent of any room.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PresenceInfo {
    pub user_id: UserId,
    pub user_name: String,
    pub status: String,
}

/// One breakout sub-room assignment.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BreakoutRoom {
    pub id: String,
    pub name: String,
    pub assigned: Vec<UserId>,
}

/// Directives a host or co-host may issue against another participant.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum HostAction {
    MuteAudio,
    UnmuteAudio,
    DisableVideo,
    EnableVideo,
    LowerHand,
    Remove,
    PromoteCoHost,
}

/// Meeting-wide controls. Host only.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum MeetingAction {
    Lock,
    Unlock,
    MuteAll,
    UpdatePolicy { policy: MeetingPolicy },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum EngagementAction {
    RaiseHand,
    LowerHand,
    Reaction { emoji: String },
    /// Host only.
    LowerAllHands,
}

/// Self-owned media flag changes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum MediaAction {
    MuteAudio,
    UnmuteAudio,
    EnableVideo,
    DisableVideo,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ShareAction {
    Start,
    Stop,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum WhiteboardAction {
    /// Host only.
    Open,
    /// Host only.
    Close,
    /// Append a stroke; the raw path is opaque to the server.
    Draw { path: Value },
    Clear,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum PollAction {
    /// Host or co-host.
    Create { question: String, options: Vec<String> },
    /// Any room member.
    Respond { poll_id: PollId, option_index: usize },
    /// Host or co-host.
    End { poll_id: PollId },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum BreakoutAction {
    Create { rooms: Vec<BreakoutRoom> },
    Close,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum RecordingAction {
    Start,
    Stop,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum WaitingAction {
    Approve,
    Deny,
}

/// Messages sent from client to server.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Join a room, creating it implicitly on first join.
    /// # Fields
    /// * `room_id` - Room to join
    /// * `user_id` / `user_name` - Pre-established identity
    /// * `role` - Requested role
    JoinRoom {
        room_id: RoomId,
        user_id: UserId,
        user_name: String,
        role: Role,
    },
    LeaveRoom {
        room_id: RoomId,
        user_id: UserId,
    },
    /// WebRTC offer. Unicast when `target_id` is set, otherwise broadcast
    /// to every other room participant.
    Offer {
        room_id: RoomId,
        offer: Value,
        #[serde(default)]
        target_id: Option<UserId>,
    },
    /// WebRTC answer. Always targeted; an untargeted answer is dropped.
    Answer {
        room_id: RoomId,
        answer: Value,
        #[serde(default)]
        to: Option<UserId>,
    },
    /// ICE candidate. Unicast when targeted, broadcast otherwise.
    IceCandidate {
        room_id: RoomId,
        candidate: Value,
        #[serde(default)]
        target_id: Option<UserId>,
    },
    /// Room chat, or a private message when `to_user_id` is set.
    ChatMessage {
        room_id: RoomId,
        message: String,
        #[serde(default)]
        to_user_id: Option<UserId>,
    },
    /// Register presence (lobby), independent of room membership.
    RegisterUser {
        user_id: UserId,
        user_name: String,
        #[serde(default)]
        status: Option<String>,
    },
    UpdateStatus {
        user_id: UserId,
        status: String,
    },
    InitiateCall {
        to_user_id: UserId,
        call_id: String,
        #[serde(default)]
        room_id: Option<RoomId>,
    },
    AcceptCall {
        to_user_id: UserId,
        call_id: String,
    },
    DeclineCall {
        to_user_id: UserId,
        call_id: String,
        #[serde(default)]
        reason: Option<String>,
    },
    /// Create a pre-room call group; `group_id` becomes the room scope.
    CreateGroup {
        group_id: GroupId,
        group_name: String,
        creator_id: UserId,
    },
    HostControl {
        room_id: RoomId,
        target_user_id: UserId,
        #[serde(flatten)]
        action: HostAction,
    },
    MeetingControl {
        room_id: RoomId,
        #[serde(flatten)]
        action: MeetingAction,
    },
    Engagement {
        room_id: RoomId,
        #[serde(flatten)]
        action: EngagementAction,
    },
    MediaState {
        room_id: RoomId,
        #[serde(flatten)]
        action: MediaAction,
    },
    ScreenShare {
        room_id: RoomId,
        #[serde(flatten)]
        action: ShareAction,
    },
    Whiteboard {
        room_id: RoomId,
        #[serde(flatten)]
        action: WhiteboardAction,
    },
    Poll {
        room_id: RoomId,
        #[serde(flatten)]
        action: PollAction,
    },
    BreakoutRooms {
        room_id: RoomId,
        #[serde(flatten)]
        action: BreakoutAction,
    },
    Recording {
        room_id: RoomId,
        #[serde(flatten)]
        action: RecordingAction,
    },
    /// Host decision on a pending waiting-room entry.
    WaitingRoom {
        room_id: RoomId,
        user_id: UserId,
        #[serde(flatten)]
        action: WaitingAction,
    },
}

/// Messages sent from server to client.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Broadcast to the rest of the room when someone is admitted.
    UserJoined {
        user_id: UserId,
        user_name: String,
        role: Role,
    },
    /// Reply to the joiner: current roster (excluding them) plus policy.
    RoomUsers {
        users: Vec<ParticipantInfo>,
        policy: MeetingPolicy,
    },
    UserLeft {
        user_id: UserId,
    },
    Offer {
        from: UserId,
        offer: Value,
    },
    Answer {
        from: UserId,
        answer: Value,
    },
    IceCandidate {
        from: UserId,
        candidate: Value,
    },
    NewMessage {
        user_id: UserId,
        user_name: String,
        message: String,
        private: bool,
        timestamp: String,
    },
    /// Reply to `register-user`: everyone currently in the lobby.
    OnlineUsers {
        users: Vec<PresenceInfo>,
    },
    UserOnline {
        user_id: UserId,
        user_name: String,
        status: String,
    },
    UserOffline {
        user_id: UserId,
    },
    StatusUpdated {
        user_id: UserId,
        status: String,
    },
    IncomingCall {
        from_user_id: UserId,
        from_user_name: String,
        call_id: String,
        room_id: Option<RoomId>,
    },
    CallAccepted {
        user_id: UserId,
        call_id: String,
    },
    CallDeclined {
        user_id: UserId,
        call_id: String,
        reason: Option<String>,
    },
    GroupCreated {
        group_id: GroupId,
        group_name: String,
        creator_id: UserId,
        members: Vec<UserId>,
    },
    GroupUpdated {
        group_id: GroupId,
        members: Vec<UserId>,
    },
    /// To the host(s): someone is waiting for admission.
    WaitingJoinRequest {
        room_id: RoomId,
        user_id: UserId,
        user_name: String,
    },
    /// To the requester: you are queued, awaiting host approval.
    WaitingRoomPending {
        room_id: RoomId,
    },
    /// To the requester: the host denied admission.
    JoinDenied {
        room_id: RoomId,
    },
    PolicyUpdated {
        policy: MeetingPolicy,
    },
    ParticipantUpdated {
        user_id: UserId,
        is_audio_muted: bool,
        is_video_enabled: bool,
        is_hand_raised: bool,
        is_screen_sharing: bool,
    },
    RoleChanged {
        user_id: UserId,
        role: Role,
    },
    RemovedFromRoom {
        room_id: RoomId,
    },
    HandRaised {
        user_id: UserId,
    },
    HandLowered {
        user_id: UserId,
    },
    AllHandsLowered,
    Reaction {
        user_id: UserId,
        emoji: String,
    },
    ScreenShareStarted {
        user_id: UserId,
    },
    ScreenShareStopped {
        user_id: UserId,
    },
    WhiteboardOpened,
    WhiteboardClosed,
    WhiteboardStroke {
        user_id: UserId,
        path: Value,
    },
    WhiteboardCleared,
    PollStarted {
        poll_id: PollId,
        question: String,
        options: Vec<String>,
    },
    PollUpdated {
        poll_id: PollId,
        responses: usize,
    },
    /// Final tally, one count per option (ties are not broken).
    PollEnded {
        poll_id: PollId,
        question: String,
        options: Vec<String>,
        counts: Vec<u32>,
    },
    BreakoutRoomsUpdated {
        rooms: Vec<BreakoutRoom>,
    },
    BreakoutRoomsClosed,
    RecordingStatus {
        active: bool,
        by: UserId,
    },
    Error {
        code: String,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_wire_format() {
        let json = r#"{
            "type": "join-room",
            "roomId": "r1",
            "userId": "u1",
            "userName": "Alice",
            "role": "HOST"
        }"#;

        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::JoinRoom {
                room_id,
                user_id,
                user_name,
                role,
            } => {
                assert_eq!(room_id, "r1");
                assert_eq!(user_id, "u1");
                assert_eq!(user_name, "Alice");
                assert_eq!(role, Role::Host);
            },
            other => panic!("Expected JoinRoom, got {other:?}"),
        }
    }

    #[test]
    fn test_optional_target_defaults_to_none() {
        let json = r#"{"type":"offer","roomId":"r1","offer":{"sdp":"x"}}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::Offer { target_id, .. } => assert!(target_id.is_none()),
            other => panic!("Expected Offer, got {other:?}"),
        }
    }

    #[test]
    fn test_flattened_action_round_trip() {
        let json = r#"{
            "type": "poll",
            "roomId": "r1",
            "action": "respond",
            "pollId": "p1",
            "optionIndex": 2
        }"#;

        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Poll {
                room_id: "r1".to_string(),
                action: PollAction::Respond {
                    poll_id: "p1".to_string(),
                    option_index: 2,
                },
            }
        );

        // Serializing flattens the action tag back into the envelope
        let out = serde_json::to_value(&msg).unwrap();
        assert_eq!(out["type"], "poll");
        assert_eq!(out["action"], "respond");
        assert_eq!(out["optionIndex"], 2);
    }

    #[test]
    fn test_server_message_serialization() {
        let msg = ServerMessage::UserJoined {
            user_id: "u2".to_string(),
            user_name: "Bob".to_string(),
            role: Role::CoHost,
        };

        let out = serde_json::to_value(&msg).unwrap();
        assert_eq!(out["type"], "user-joined");
        assert_eq!(out["userId"], "u2");
        assert_eq!(out["role"], "CO_HOST");
    }

    #[test]
    fn test_policy_defaults() {
        let policy = MeetingPolicy::default();
        assert!(!policy.lock_meeting);
        assert!(!policy.enable_waiting_room);
        assert!(policy.allow_chat);
        assert!(policy.allow_raise_hand);
    }

    #[test]
    fn test_malformed_message_is_an_error() {
        // Missing required roomId
        let json = r#"{"type":"leave-room","userId":"u1"}"#;
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());
    }
}
