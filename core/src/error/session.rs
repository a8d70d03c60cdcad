use serde_json::json;
use thiserror::Error;

use super::store::StoreError;
use crate::session::SessionStatus;

pub const SESSION_LIFECYCLE_CONFLICT: &str = "SESSION_LIFECYCLE_CONFLICT";
pub const AGENT_ALREADY_RUNNING: &str = "AGENT_ALREADY_RUNNING";

/// Errors raised by guarded session transitions. A conflict never mutates the
/// stored session and is always safe to surface to the caller.
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("session {session_id}: illegal transition {from} -> {to}")]
    Conflict {
        session_id: String,
        from: SessionStatus,
        to: SessionStatus,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LifecycleError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Conflict { .. } => SESSION_LIFECYCLE_CONFLICT,
            Self::Store(e) => e.code(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// `{ code, details: { sessionId, fromStatus, toStatus } }`
    pub fn to_payload(&self) -> serde_json::Value {
        match self {
            Self::Conflict {
                session_id,
                from,
                to,
            } => json!({
                "code": SESSION_LIFECYCLE_CONFLICT,
                "details": {
                    "sessionId": session_id,
                    "fromStatus": from.as_str(),
                    "toStatus": to.as_str(),
                },
            }),
            Self::Store(e) => json!({ "code": e.code(), "message": e.to_string() }),
        }
    }
}

/// Errors raised while reserving a session slot. An occupied scope is not an
/// error; see [`crate::session::GuardOutcome`].
#[derive(Error, Debug)]
pub enum GuardError {
    #[error("session {session_id} is {status} and cannot hold a guard")]
    InactiveSession {
        session_id: String,
        status: SessionStatus,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl GuardError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InactiveSession { .. } => SESSION_LIFECYCLE_CONFLICT,
            Self::Store(e) => e.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_payload_shape() {
        let err = LifecycleError::Conflict {
            session_id: "s-1".into(),
            from: SessionStatus::Completed,
            to: SessionStatus::Running,
        };
        let payload = err.to_payload();
        assert_eq!(payload["code"], "SESSION_LIFECYCLE_CONFLICT");
        assert_eq!(payload["details"]["sessionId"], "s-1");
        assert_eq!(payload["details"]["fromStatus"], "completed");
        assert_eq!(payload["details"]["toStatus"], "running");
    }
}
