// ============================
// crates/backend-lib/src/hub/presence.rs
// ============================
//! Lobby presence, call invitations and pre-room groups.
use super::{Group, Hub, PresenceEntry};
use crate::connections::ConnId;
use crate::error::HubError;
use huddle_common::{GroupId, PresenceInfo, RoomId, ServerMessage, UserId};
use std::collections::HashSet;

impl Hub {
    /// Register presence. Re-registration replaces any prior entry,
    /// re-keying the user to this connection.
    pub(super) fn register_user(
        &mut self,
        conn: ConnId,
        user_id: UserId,
        user_name: String,
        status: Option<String>,
    ) -> Result<(), HubError> {
        let status = status.unwrap_or_else(|| "online".to_string());
        self.presence.insert(
            user_id.clone(),
            PresenceEntry {
                user_name: user_name.clone(),
                conn,
                status: status.clone(),
            },
        );

        let users = self
            .presence
            .iter()
            .map(|(id, entry)| PresenceInfo {
                user_id: id.clone(),
                user_name: entry.user_name.clone(),
                status: entry.status.clone(),
            })
            .collect();
        self.send_to_conn(conn, ServerMessage::OnlineUsers { users });
        self.broadcast_presence(
            &ServerMessage::UserOnline {
                user_id,
                user_name,
                status,
            },
            Some(conn),
        );
        Ok(())
    }

    pub(super) fn update_status(
        &mut self,
        conn: ConnId,
        user_id: &str,
        status: String,
    ) -> Result<(), HubError> {
        match self.presence.get_mut(user_id) {
            // Only the owning connection may mutate the entry; anything
            // else is a stale sender.
            Some(entry) if entry.conn == conn => entry.status = status.clone(),
            _ => return Err(HubError::NotFound("presence entry")),
        }
        self.broadcast_presence(
            &ServerMessage::StatusUpdated {
                user_id: user_id.to_string(),
                status,
            },
            None,
        );
        Ok(())
    }

    /// Resolve the caller's identity from their presence entry.
    fn presence_of_conn(&self, conn: ConnId) -> Result<(UserId, String), HubError> {
        self.presence
            .iter()
            .find(|(_, entry)| entry.conn == conn)
            .map(|(user_id, entry)| (user_id.clone(), entry.user_name.clone()))
            .ok_or(HubError::NotFound("caller presence"))
    }

    pub(super) fn initiate_call(
        &mut self,
        conn: ConnId,
        to_user_id: &str,
        call_id: String,
        room_id: Option<RoomId>,
    ) -> Result<(), HubError> {
        let (from_user_id, from_user_name) = self.presence_of_conn(conn)?;
        let callee = self
            .presence
            .get(to_user_id)
            .ok_or(HubError::NotFound("callee presence"))?;
        self.send_to_conn(
            callee.conn,
            ServerMessage::IncomingCall {
                from_user_id,
                from_user_name,
                call_id,
                room_id,
            },
        );
        Ok(())
    }

    pub(super) fn accept_call(
        &mut self,
        conn: ConnId,
        to_user_id: &str,
        call_id: String,
    ) -> Result<(), HubError> {
        let (user_id, _) = self.presence_of_conn(conn)?;
        let peer = self
            .presence
            .get(to_user_id)
            .ok_or(HubError::NotFound("caller presence"))?;
        self.send_to_conn(peer.conn, ServerMessage::CallAccepted { user_id, call_id });
        Ok(())
    }

    pub(super) fn decline_call(
        &mut self,
        conn: ConnId,
        to_user_id: &str,
        call_id: String,
        reason: Option<String>,
    ) -> Result<(), HubError> {
        let (user_id, _) = self.presence_of_conn(conn)?;
        let peer = self
            .presence
            .get(to_user_id)
            .ok_or(HubError::NotFound("caller presence"))?;
        self.send_to_conn(
            peer.conn,
            ServerMessage::CallDeclined {
                user_id,
                call_id,
                reason,
            },
        );
        Ok(())
    }

    /// Create a pre-room call group. The group id becomes the room scope,
    /// so creation also seeds the future room's policy defaults.
    pub(super) fn create_group(
        &mut self,
        conn: ConnId,
        group_id: GroupId,
        group_name: String,
        creator_id: UserId,
    ) -> Result<(), HubError> {
        if self.groups.contains_key(&group_id) {
            return Err(HubError::PolicyViolation("group already exists"));
        }
        self.policies.entry(group_id.clone()).or_default();

        let mut members = HashSet::new();
        members.insert(creator_id.clone());
        self.groups.insert(
            group_id.clone(),
            Group {
                group_name: group_name.clone(),
                creator_id: creator_id.clone(),
                members,
            },
        );

        self.send_to_conn(
            conn,
            ServerMessage::GroupCreated {
                group_id,
                group_name,
                creator_id: creator_id.clone(),
                members: vec![creator_id],
            },
        );
        Ok(())
    }

    /// Push the updated roster to every group member who is online.
    pub(super) fn notify_group_roster(&self, group_id: &str) {
        let Some(group) = self.groups.get(group_id) else {
            return;
        };
        let members: Vec<UserId> = group.members.iter().cloned().collect();
        let msg = ServerMessage::GroupUpdated {
            group_id: group_id.to_string(),
            members: members.clone(),
        };
        for user_id in &members {
            if let Some(entry) = self.presence.get(user_id) {
                self.send_to_conn(entry.conn, msg.clone());
            }
        }
    }
}
