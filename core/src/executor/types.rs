use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Per-ticket status inside one plan execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketExecutionStatus {
    Pending,
    Running,
    Done,
    Failed,
    Skipped,
}

impl TicketExecutionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Skipped)
    }

    /// Whether dependents of a ticket in this status must be skipped.
    pub fn blocks_dependents(self) -> bool {
        matches!(self, Self::Failed | Self::Skipped)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for TicketExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Layered plan plus one status entry per requested ticket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPlan {
    pub layers: Vec<Vec<String>>,
    pub ticket_status: BTreeMap<String, TicketExecutionStatus>,
}

impl ExecutionPlan {
    /// Requested tickets that appear in no layer.
    pub fn unscheduled(&self) -> Vec<&str> {
        self.ticket_status
            .keys()
            .filter(|id| !self.layers.iter().any(|l| l.contains(*id)))
            .map(String::as_str)
            .collect()
    }
}

/// What an external launch reports back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchResult {
    pub ticket_id: String,
    /// Absent when no session was created (e.g. the scope was occupied).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LaunchResult {
    pub fn succeeded(ticket_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            ticket_id: ticket_id.into(),
            session_id: Some(session_id.into()),
            success: true,
            error: None,
        }
    }

    pub fn failed(ticket_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            ticket_id: ticket_id.into(),
            session_id: None,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Outcome of one launched ticket as recorded by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketRun {
    pub ticket_id: String,
    pub session_id: Option<String>,
    pub status: TicketExecutionStatus,
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// Full result of executing a plan.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    pub statuses: BTreeMap<String, TicketExecutionStatus>,
    pub layers: Vec<Vec<String>>,
    pub runs: BTreeMap<String, TicketRun>,
    pub duration_ms: u64,
}

impl ExecutionReport {
    pub fn count(&self, status: TicketExecutionStatus) -> usize {
        self.statuses.values().filter(|s| **s == status).count()
    }

    pub fn all_done(&self) -> bool {
        self.statuses
            .values()
            .all(|s| *s == TicketExecutionStatus::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&TicketExecutionStatus::Skipped).unwrap();
        assert_eq!(json, "\"skipped\"");
        assert!(TicketExecutionStatus::Skipped.is_terminal());
        assert!(!TicketExecutionStatus::Running.is_terminal());
        assert!(!TicketExecutionStatus::Done.blocks_dependents());
    }

    #[test]
    fn plan_serializes_camel_case() {
        let mut plan = ExecutionPlan::default();
        plan.layers.push(vec!["a".into()]);
        plan.ticket_status
            .insert("a".into(), TicketExecutionStatus::Pending);
        plan.ticket_status
            .insert("z".into(), TicketExecutionStatus::Pending);

        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(value["ticketStatus"]["a"], "pending");
        assert_eq!(plan.unscheduled(), vec!["z"]);
    }
}
