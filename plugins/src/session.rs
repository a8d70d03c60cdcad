//! In-memory session registry.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use ticketflow_core::error::StoreError;
use ticketflow_core::session::{
    AgentSession, ConflictPredicate, SessionStatus, SessionStore, SessionTransitionPatch,
};

#[derive(Default)]
struct SessionTable {
    sessions: HashMap<String, AgentSession>,
    order: Vec<String>,
}

impl SessionTable {
    fn insert(&mut self, session: AgentSession) -> Result<(), StoreError> {
        if self.sessions.contains_key(&session.id) {
            return Err(StoreError::DuplicateSession(session.id));
        }
        self.order.push(session.id.clone());
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }
}

/// Session store backed by process memory. A single mutex covers the whole
/// table, which makes `insert_unless` a true compare-and-insert.
#[derive(Default)]
pub struct InMemorySessionStore {
    table: Mutex<SessionTable>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every session ever inserted, oldest first.
    pub async fn all_sessions(&self) -> Vec<AgentSession> {
        let table = self.table.lock().await;
        table
            .order
            .iter()
            .filter_map(|id| table.sessions.get(id).cloned())
            .collect()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_session(&self, id: &str) -> Result<Option<AgentSession>, StoreError> {
        Ok(self.table.lock().await.sessions.get(id).cloned())
    }

    async fn insert_queued_session(&self, session: AgentSession) -> Result<(), StoreError> {
        self.table.lock().await.insert(session)
    }

    async fn apply_transition_patch(
        &self,
        id: &str,
        expected: SessionStatus,
        patch: SessionTransitionPatch,
    ) -> Result<AgentSession, StoreError> {
        let mut table = self.table.lock().await;
        let session = table
            .sessions
            .get_mut(id)
            .ok_or_else(|| StoreError::SessionNotFound(id.to_string()))?;
        if session.status != expected {
            return Err(StoreError::StaleStatus {
                session_id: id.to_string(),
                expected,
                actual: session.status,
            });
        }
        patch.apply_to(session);
        Ok(session.clone())
    }

    async fn list_sessions(&self, project_id: &str) -> Result<Vec<AgentSession>, StoreError> {
        let table = self.table.lock().await;
        Ok(table
            .order
            .iter()
            .filter_map(|id| table.sessions.get(id))
            .filter(|s| s.scope.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn insert_unless(
        &self,
        session: AgentSession,
        conflicts: ConflictPredicate<'_>,
    ) -> Result<Option<AgentSession>, StoreError> {
        let mut table = self.table.lock().await;
        let existing = table
            .order
            .iter()
            .filter_map(|id| table.sessions.get(id))
            .find(|s| conflicts(*s))
            .cloned();
        if existing.is_some() {
            return Ok(existing);
        }
        table.insert(session)?;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ticketflow_core::session::{build_session_transition_patch, SessionScope};

    #[tokio::test]
    async fn patch_is_refused_when_status_moved() {
        let store = InMemorySessionStore::new();
        let mut session = AgentSession::queued(SessionScope::project("p1"));
        session.status = SessionStatus::Running;
        let id = session.id.clone();
        store.insert_queued_session(session.clone()).await.unwrap();

        let cancel =
            build_session_transition_patch(&session, SessionStatus::Cancelled, Utc::now(), None)
                .unwrap();
        let complete =
            build_session_transition_patch(&session, SessionStatus::Completed, Utc::now(), None)
                .unwrap();

        store
            .apply_transition_patch(&id, SessionStatus::Running, cancel)
            .await
            .unwrap();
        let err = store
            .apply_transition_patch(&id, SessionStatus::Running, complete)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::StaleStatus {
                actual: SessionStatus::Cancelled,
                ..
            }
        ));
        let stored = store.get_session(&id).await.unwrap().unwrap();
        assert_eq!(stored.status, SessionStatus::Cancelled);
    }
}
