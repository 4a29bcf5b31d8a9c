// crates/backend-lib/src/error.rs

//! Central error taxonomy for event handling.
//!
//! Every inbound event either succeeds, produces a user-visible `error`
//! event (policy or authorization failures), or is dropped with a
//! diagnostic (stale references, malformed payloads). No failure is
//! retried and none terminates the connection.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HubError {
    #[error("meeting is locked")]
    MeetingLocked,

    #[error("{0}")]
    PolicyViolation(&'static str),

    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("malformed request: {0}")]
    Malformed(String),
}

impl HubError {
    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            HubError::MeetingLocked => "MEETING_LOCKED",
            HubError::PolicyViolation(_) => "POLICY_VIOLATION",
            HubError::Unauthorized(_) => "UNAUTHORIZED",
            HubError::NotFound(_) => "NOT_FOUND",
            HubError::Malformed(_) => "MALFORMED_REQUEST",
        }
    }

    /// Policy and authorization failures are reported back to the caller.
    /// Stale references and malformed payloads are benign races or caller
    /// bugs and are only logged.
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            HubError::MeetingLocked | HubError::PolicyViolation(_) | HubError::Unauthorized(_)
        )
    }
}
