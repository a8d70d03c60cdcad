//! Guarded status transitions for worker sessions.

use chrono::{DateTime, Utc};

use super::store::SessionStore;
use super::types::{AgentSession, SessionStatus, SessionTransitionPatch};
use crate::error::{LifecycleError, StoreError};

/// Transition rules for [`SessionStatus`].
pub struct SessionLifecycle;

impl SessionLifecycle {
    /// Whether `from -> to` is an allowed edge. Re-entering the current
    /// non-terminal state is allowed so retried handlers stay harmless.
    pub fn can_transition(from: SessionStatus, to: SessionStatus) -> bool {
        use SessionStatus::*;

        match (from, to) {
            (Completed | Failed | Cancelled, _) => false,
            (Queued, Queued | Running | Failed | Cancelled) => true,
            (Running, Running | Completed | Failed | Cancelled) => true,
            _ => false,
        }
    }

    pub fn validate(
        session_id: &str,
        from: SessionStatus,
        to: SessionStatus,
    ) -> Result<(), LifecycleError> {
        if Self::can_transition(from, to) {
            Ok(())
        } else {
            Err(LifecycleError::Conflict {
                session_id: session_id.to_string(),
                from,
                to,
            })
        }
    }
}

/// Build the field patch for moving `session` to `to_status`.
///
/// Timestamps are only filled when currently unset, so applying the same
/// transition twice leaves the first values in place.
pub fn build_session_transition_patch(
    session: &AgentSession,
    to_status: SessionStatus,
    timestamp: DateTime<Utc>,
    error: Option<String>,
) -> Result<SessionTransitionPatch, LifecycleError> {
    SessionLifecycle::validate(&session.id, session.status, to_status)?;

    let mut patch = SessionTransitionPatch {
        status: to_status,
        started_at: None,
        ended_at: None,
        completed_at: None,
        error: None,
    };

    if to_status == SessionStatus::Running && session.started_at.is_none() {
        patch.started_at = Some(timestamp);
    }

    if to_status.is_terminal() {
        if session.ended_at.is_none() {
            patch.ended_at = Some(timestamp);
        }
        if session.completed_at.is_none() {
            patch.completed_at = Some(timestamp);
        }
        patch.error = Some(error);
    }

    Ok(patch)
}

/// Load, validate and persist a transition through `store`.
///
/// The write is conditional on the status that was validated. When another
/// writer got there first the transition is re-validated against the fresh
/// record, so a terminal session is never overwritten.
pub async fn transition_session(
    store: &dyn SessionStore,
    session_id: &str,
    to_status: SessionStatus,
    error: Option<String>,
) -> Result<AgentSession, LifecycleError> {
    loop {
        let session = store
            .get_session(session_id)
            .await?
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))?;

        let patch =
            match build_session_transition_patch(&session, to_status, Utc::now(), error.clone()) {
                Ok(patch) => patch,
                Err(err) => {
                    tracing::warn!(
                        session_id,
                        from = %session.status,
                        to = %to_status,
                        "rejected session transition"
                    );
                    return Err(err);
                }
            };

        match store
            .apply_transition_patch(session_id, session.status, patch)
            .await
        {
            Ok(updated) => {
                tracing::info!(
                    session_id,
                    from = %session.status,
                    to = %updated.status,
                    "session transition"
                );
                return Ok(updated);
            }
            Err(StoreError::StaleStatus { actual, .. }) => {
                tracing::debug!(
                    session_id,
                    expected = %session.status,
                    %actual,
                    "session moved underneath transition, retrying"
                );
            }
            Err(err) => return Err(err.into()),
        }
    }
}
