//! Session records and scope keys.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Worker-session status. `pending` is an older spelling of `queued` and is
/// accepted on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[serde(alias = "pending")]
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "queued" | "pending" => Ok(Self::Queued),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown session status: {other}")),
        }
    }
}

/// Granularity of a scope key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeLevel {
    Project,
    Epic,
    Story,
}

/// Target a worker session locks: a whole project, one epic, or one story.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionScope {
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epic_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_story_id: Option<String>,
}

impl SessionScope {
    pub fn project(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            epic_id: None,
            user_story_id: None,
        }
    }

    pub fn epic(project_id: impl Into<String>, epic_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            epic_id: Some(epic_id.into()),
            user_story_id: None,
        }
    }

    pub fn story(
        project_id: impl Into<String>,
        epic_id: Option<String>,
        story_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            epic_id,
            user_story_id: Some(story_id.into()),
        }
    }

    pub fn level(&self) -> ScopeLevel {
        match (&self.epic_id, &self.user_story_id) {
            (_, Some(_)) => ScopeLevel::Story,
            (Some(_), None) => ScopeLevel::Epic,
            (None, None) => ScopeLevel::Project,
        }
    }

    /// Whether a session holding `self` also holds `other`.
    pub fn covers(&self, other: &SessionScope) -> bool {
        if self.project_id != other.project_id {
            return false;
        }
        match self.level() {
            ScopeLevel::Project => true,
            ScopeLevel::Epic => self.epic_id.is_some() && self.epic_id == other.epic_id,
            ScopeLevel::Story => {
                self.user_story_id.is_some() && self.user_story_id == other.user_story_id
            }
        }
    }

    pub fn conflicts_with(&self, other: &SessionScope) -> bool {
        self.covers(other) || other.covers(self)
    }
}

impl fmt::Display for SessionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.project_id)?;
        if let Some(epic) = &self.epic_id {
            write!(f, "/epic:{epic}")?;
        }
        if let Some(story) = &self.user_story_id {
            write!(f, "/story:{story}")?;
        }
        Ok(())
    }
}

/// A worker session record. `started_at`, `ended_at` and `completed_at` are
/// set once and never overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSession {
    pub id: String,
    pub scope: SessionScope,
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentSession {
    /// New session in `queued` with a random id.
    pub fn queued(scope: SessionScope) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            scope,
            status: SessionStatus::Queued,
            ticket_id: None,
            started_at: None,
            ended_at: None,
            completed_at: None,
            error: None,
        }
    }

    pub fn with_ticket(mut self, ticket_id: impl Into<String>) -> Self {
        self.ticket_id = Some(ticket_id.into());
        self
    }

    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }
}

/// Field updates produced by a guarded transition. `None` leaves the stored
/// value untouched; `error: Some(None)` clears it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTransitionPatch {
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Absent: keep. `null`: clear. A string: replace.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_field"
    )]
    pub error: Option<Option<String>>,
}

// Only runs when the key is present, so an explicit `null` stays `Some(None)`.
fn present_field<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl SessionTransitionPatch {
    pub fn apply_to(&self, session: &mut AgentSession) {
        session.status = self.status;
        if session.started_at.is_none() {
            session.started_at = self.started_at;
        }
        if session.ended_at.is_none() {
            session.ended_at = self.ended_at;
        }
        if session.completed_at.is_none() {
            session.completed_at = self.completed_at;
        }
        if let Some(error) = &self.error {
            session.error = error.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_pending_reads_as_queued() {
        let status: SessionStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(status, SessionStatus::Queued);
        assert_eq!("PENDING".parse::<SessionStatus>().unwrap(), SessionStatus::Queued);
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"queued\"");
    }

    #[test]
    fn project_scope_covers_everything_in_project() {
        let project = SessionScope::project("p1");
        let story = SessionScope::story("p1", Some("e1".into()), "s1");
        assert!(project.covers(&story));
        assert!(!story.covers(&project));
        assert!(story.conflicts_with(&project));
        assert!(!project.conflicts_with(&SessionScope::project("p2")));
    }

    #[test]
    fn epic_scope_blocks_its_stories_only() {
        let epic = SessionScope::epic("p1", "e1");
        let own = SessionScope::story("p1", Some("e1".into()), "s1");
        let other = SessionScope::story("p1", Some("e2".into()), "s2");
        assert!(epic.conflicts_with(&own));
        assert!(!epic.conflicts_with(&other));
        assert!(!epic.conflicts_with(&SessionScope::epic("p1", "e2")));
    }

    #[test]
    fn sibling_stories_do_not_conflict() {
        let a = SessionScope::story("p1", Some("e1".into()), "s1");
        let b = SessionScope::story("p1", Some("e1".into()), "s2");
        assert!(!a.conflicts_with(&b));
        assert!(a.conflicts_with(&a.clone()));
    }

    #[test]
    fn patch_error_survives_serialization() {
        let mut patch = SessionTransitionPatch {
            status: SessionStatus::Completed,
            started_at: None,
            ended_at: None,
            completed_at: None,
            error: Some(None),
        };
        for error in [None, Some(None), Some(Some("boom".to_string()))] {
            patch.error = error;
            let json = serde_json::to_string(&patch).unwrap();
            let back: SessionTransitionPatch = serde_json::from_str(&json).unwrap();
            assert_eq!(back, patch, "{json}");
        }
    }

    #[test]
    fn scope_serializes_camel_case() {
        let scope = SessionScope::story("p1", Some("e1".into()), "s1");
        let value = serde_json::to_value(&scope).unwrap();
        assert_eq!(value["projectId"], "p1");
        assert_eq!(value["epicId"], "e1");
        assert_eq!(value["userStoryId"], "s1");
    }
}
