//! JSON snapshot files seeding the in-memory graph store.
//!
//! ```json
//! {
//!   "tickets": [{ "id": "E1", "projectId": "p1", "scopeType": "project", "scopeId": "p1" }],
//!   "edges": [{ "ticketId": "E2", "dependsOnTicketId": "E1", "projectId": "p1",
//!               "scopeType": "project", "scopeId": "p1" }]
//! }
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use ticketflow_core::graph::{DependencyEdge, TicketOwner};
use ticketflow_core::session::ScopeLevel;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketRecord {
    pub id: String,
    pub project_id: String,
    #[serde(default = "default_scope_type")]
    pub scope_type: ScopeLevel,
    /// Defaults to the project id.
    #[serde(default)]
    pub scope_id: Option<String>,
}

fn default_scope_type() -> ScopeLevel {
    ScopeLevel::Project
}

impl TicketRecord {
    pub fn new(id: String, owner: TicketOwner) -> Self {
        Self {
            id,
            project_id: owner.project_id,
            scope_type: owner.scope_type,
            scope_id: Some(owner.scope_id),
        }
    }

    pub fn owner(&self) -> TicketOwner {
        TicketOwner {
            project_id: self.project_id.clone(),
            scope_type: self.scope_type,
            scope_id: self
                .scope_id
                .clone()
                .unwrap_or_else(|| self.project_id.clone()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub tickets: Vec<TicketRecord>,
    #[serde(default)]
    pub edges: Vec<DependencyEdge>,
}

impl GraphSnapshot {
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("read snapshot {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("parse snapshot {}", path.display()))
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("write snapshot {}", path.display()))
    }
}
