use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::session::{ScopeLevel, SessionScope};

/// `ticket_id` cannot begin until `depends_on_ticket_id` has succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyEdge {
    pub ticket_id: String,
    pub depends_on_ticket_id: String,
    pub project_id: String,
    pub scope_type: ScopeLevel,
    pub scope_id: String,
}

/// Where a ticket lives: its project and the container its dependencies are
/// declared in (the project for epics, the parent epic for stories).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketOwner {
    pub project_id: String,
    pub scope_type: ScopeLevel,
    pub scope_id: String,
}

impl TicketOwner {
    pub fn project(project_id: impl Into<String>) -> Self {
        let project_id = project_id.into();
        Self {
            scope_id: project_id.clone(),
            project_id,
            scope_type: ScopeLevel::Project,
        }
    }

    pub fn epic(project_id: impl Into<String>, epic_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            scope_type: ScopeLevel::Epic,
            scope_id: epic_id.into(),
        }
    }

    /// Scope a worker session for `ticket_id` has to lock.
    pub fn session_scope(&self, ticket_id: &str) -> SessionScope {
        match self.scope_type {
            ScopeLevel::Project => SessionScope::epic(&self.project_id, ticket_id),
            ScopeLevel::Epic => {
                SessionScope::story(&self.project_id, Some(self.scope_id.clone()), ticket_id)
            }
            ScopeLevel::Story => SessionScope::story(&self.project_id, None, ticket_id),
        }
    }
}

/// Snapshot of a project's dependency edges in adjacency form.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// ticket -> tickets it depends on
    pub edges: HashMap<String, Vec<String>>,

    /// ticket -> tickets that depend on it
    pub reverse_edges: HashMap<String, Vec<String>>,

    /// First-seen order of every node, used for deterministic traversal.
    insertion_order: Vec<String>,
}

impl DependencyGraph {
    pub fn from_edges<'a, I>(edges: I) -> Self
    where
        I: IntoIterator<Item = &'a DependencyEdge>,
    {
        let mut graph = Self::default();
        let mut seen_pairs: HashSet<(String, String)> = HashSet::new();

        for edge in edges {
            graph.add_node(&edge.ticket_id);
            graph.add_node(&edge.depends_on_ticket_id);

            let pair = (edge.ticket_id.clone(), edge.depends_on_ticket_id.clone());
            if !seen_pairs.insert(pair) {
                continue;
            }

            graph
                .edges
                .entry(edge.ticket_id.clone())
                .or_default()
                .push(edge.depends_on_ticket_id.clone());
            graph
                .reverse_edges
                .entry(edge.depends_on_ticket_id.clone())
                .or_default()
                .push(edge.ticket_id.clone());
        }

        graph
    }

    fn add_node(&mut self, id: &str) {
        if !self.edges.contains_key(id) {
            self.edges.insert(id.to_string(), Vec::new());
            self.insertion_order.push(id.to_string());
        }
    }

    pub fn nodes(&self) -> &[String] {
        &self.insertion_order
    }

    pub fn dependencies_of(&self, ticket_id: &str) -> &[String] {
        self.edges.get(ticket_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn dependents_of(&self, ticket_id: &str) -> &[String] {
        self.reverse_edges
            .get(ticket_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
