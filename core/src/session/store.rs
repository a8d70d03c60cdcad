use async_trait::async_trait;

use super::types::{AgentSession, SessionStatus, SessionTransitionPatch};
use crate::error::StoreError;

/// Predicate evaluated against stored sessions inside an atomic insert.
pub type ConflictPredicate<'a> = &'a (dyn Fn(&AgentSession) -> bool + Send + Sync);

/// Session registry collaborator.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get_session(&self, id: &str) -> Result<Option<AgentSession>, StoreError>;

    async fn insert_queued_session(&self, session: AgentSession) -> Result<(), StoreError>;

    /// Apply `patch` only if the stored status is still `expected`, and return
    /// the stored record afterwards. The comparison and the write must be one
    /// indivisible operation; a mismatch is [`StoreError::StaleStatus`].
    async fn apply_transition_patch(
        &self,
        id: &str,
        expected: SessionStatus,
        patch: SessionTransitionPatch,
    ) -> Result<AgentSession, StoreError>;

    async fn list_sessions(&self, project_id: &str) -> Result<Vec<AgentSession>, StoreError>;

    /// Insert `session` unless some stored session satisfies `conflicts`.
    ///
    /// The check and the insert must be one indivisible operation. Returns the
    /// first conflicting session when nothing was inserted.
    async fn insert_unless(
        &self,
        session: AgentSession,
        conflicts: ConflictPredicate<'_>,
    ) -> Result<Option<AgentSession>, StoreError>;
}
