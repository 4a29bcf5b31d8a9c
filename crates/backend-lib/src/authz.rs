// ============================
// crates/backend-lib/src/authz.rs
// ============================
//! Role-based authorization gate.
//!
//! A failed check emits `Unauthorized` back to the caller and mutates
//! nothing; it never terminates the connection.
use crate::error::HubError;
use huddle_common::Role;

pub fn authorize(role: Role, required: &[Role], what: &'static str) -> Result<(), HubError> {
    if required.contains(&role) {
        Ok(())
    } else {
        Err(HubError::Unauthorized(what))
    }
}

/// Meeting-wide controls, waiting-room decisions, recording, whiteboard
/// open/close and breakout management are host-only.
pub fn require_host(role: Role) -> Result<(), HubError> {
    authorize(role, &[Role::Host], "host only")
}

/// Participant-level directives and poll management also admit co-hosts.
pub fn require_moderator(role: Role) -> Result<(), HubError> {
    authorize(role, &[Role::Host, Role::CoHost], "host or co-host only")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_only_gate() {
        assert!(require_host(Role::Host).is_ok());
        assert!(require_host(Role::CoHost).is_err());
        assert!(require_host(Role::Participant).is_err());
    }

    #[test]
    fn test_moderator_gate() {
        assert!(require_moderator(Role::Host).is_ok());
        assert!(require_moderator(Role::CoHost).is_ok());
        assert!(matches!(
            require_moderator(Role::Participant),
            Err(HubError::Unauthorized(_))
        ));
    }
}
