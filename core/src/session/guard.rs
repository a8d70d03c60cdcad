//! At most one active session per scope.

use serde::Serialize;
use serde_json::json;

use super::store::SessionStore;
use super::types::{AgentSession, ScopeLevel, SessionScope};
use crate::error::session::AGENT_ALREADY_RUNNING;
use crate::error::{GuardError, StoreError};

/// Scope description carried by an "already running" conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardTarget {
    pub scope: ScopeLevel,
    pub project_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epic_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_id: Option<String>,
}

impl From<&SessionScope> for GuardTarget {
    fn from(scope: &SessionScope) -> Self {
        Self {
            scope: scope.level(),
            project_id: scope.project_id.clone(),
            epic_id: scope.epic_id.clone(),
            story_id: scope.user_story_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardConflict {
    pub active_session_id: String,
    pub target: GuardTarget,
}

impl GuardConflict {
    pub fn code(&self) -> &'static str {
        AGENT_ALREADY_RUNNING
    }

    /// `{ code, data: { activeSessionId, target } }`
    pub fn to_payload(&self) -> serde_json::Value {
        json!({ "code": AGENT_ALREADY_RUNNING, "data": self })
    }
}

impl std::fmt::Display for GuardConflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: session {} already holds {:?} scope in project {}",
            AGENT_ALREADY_RUNNING, self.active_session_id, self.target.scope, self.target.project_id
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GuardOutcome {
    Reserved(AgentSession),
    AlreadyRunning(GuardConflict),
}

impl GuardOutcome {
    pub fn is_reserved(&self) -> bool {
        matches!(self, Self::Reserved(_))
    }
}

/// Return a non-terminal session whose scope conflicts with `scope`.
pub async fn get_running_session_for_target(
    store: &dyn SessionStore,
    scope: &SessionScope,
) -> Result<Option<AgentSession>, StoreError> {
    let sessions = store.list_sessions(&scope.project_id).await?;
    Ok(sessions
        .into_iter()
        .find(|s| s.is_active() && s.scope.conflicts_with(scope)))
}

/// Atomically check that nothing active conflicts with `scope` and insert
/// `session`.
pub async fn insert_running_session_with_guard(
    store: &dyn SessionStore,
    scope: &SessionScope,
    mut session: AgentSession,
) -> Result<GuardOutcome, GuardError> {
    if !session.is_active() {
        return Err(GuardError::InactiveSession {
            session_id: session.id,
            status: session.status,
        });
    }
    session.scope = scope.clone();

    let predicate =
        |existing: &AgentSession| existing.is_active() && existing.scope.conflicts_with(scope);
    match store.insert_unless(session.clone(), &predicate).await? {
        None => {
            tracing::debug!(session_id = %session.id, %scope, "guard reserved");
            Ok(GuardOutcome::Reserved(session))
        }
        Some(active) => {
            tracing::warn!(
                active_session_id = %active.id,
                %scope,
                "guard rejected: scope already has an active session"
            );
            Ok(GuardOutcome::AlreadyRunning(GuardConflict {
                active_session_id: active.id,
                target: GuardTarget::from(scope),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_payload_shape() {
        let conflict = GuardConflict {
            active_session_id: "s-9".into(),
            target: GuardTarget::from(&SessionScope::story("p1", Some("e1".into()), "st1")),
        };
        let payload = conflict.to_payload();
        assert_eq!(payload["code"], "AGENT_ALREADY_RUNNING");
        assert_eq!(payload["data"]["activeSessionId"], "s-9");
        assert_eq!(payload["data"]["target"]["scope"], "story");
        assert_eq!(payload["data"]["target"]["projectId"], "p1");
        assert_eq!(payload["data"]["target"]["epicId"], "e1");
        assert_eq!(payload["data"]["target"]["storyId"], "st1");
    }

    #[test]
    fn project_target_omits_optional_ids() {
        let target = GuardTarget::from(&SessionScope::project("p1"));
        let value = serde_json::to_value(&target).unwrap();
        assert_eq!(value["scope"], "project");
        assert!(value.get("epicId").is_none());
        assert!(value.get("storyId").is_none());
    }
}
