use thiserror::Error;

use crate::session::SessionStatus;

/// Failures reported by graph and session collaborators.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("duplicate session id: {0}")]
    DuplicateSession(String),

    #[error("session {session_id} is {actual}, expected {expected}")]
    StaleStatus {
        session_id: String,
        expected: SessionStatus,
        actual: SessionStatus,
    },

    #[error("edge set of project {project_id} moved from revision {expected} to {actual}")]
    StaleRevision {
        project_id: String,
        expected: u64,
        actual: u64,
    },

    #[error("store backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::SessionNotFound(_) => "SESSION_NOT_FOUND",
            Self::DuplicateSession(_) => "SESSION_DUPLICATE",
            Self::StaleStatus { .. } => "SESSION_LIFECYCLE_CONFLICT",
            Self::StaleRevision { .. } => "GRAPH_REVISION_CONFLICT",
            Self::Backend(_) => "STORE_ERROR",
        }
    }
}
