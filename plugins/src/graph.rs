//! In-memory graph store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use ticketflow_core::error::{GraphError, StoreError};
use ticketflow_core::graph::{validate_edge_set, DependencyEdge, GraphStore, TicketOwner};

use crate::snapshot::{GraphSnapshot, TicketRecord};

#[derive(Default)]
struct GraphState {
    tickets: HashMap<String, TicketOwner>,
    ticket_order: Vec<String>,
    edges: Vec<DependencyEdge>,
    revisions: HashMap<String, u64>,
}

/// Graph store backed by process memory. Every write happens under one lock,
/// so `replace_edges` is atomic for readers.
#[derive(Default)]
pub struct InMemoryGraphStore {
    state: RwLock<GraphState>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot. Its edges get the same self-reference, ownership and
    /// acyclicity checks as edges written through the validator.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self, GraphError> {
        let mut state = GraphState::default();
        for ticket in snapshot.tickets {
            if !state.tickets.contains_key(&ticket.id) {
                state.ticket_order.push(ticket.id.clone());
            }
            state.tickets.insert(ticket.id.clone(), ticket.owner());
        }
        validate_edge_set(&snapshot.edges, |id| {
            state.tickets.get(id).map(|o| o.project_id.clone())
        })?;
        state.edges = snapshot.edges;
        Ok(Self {
            state: RwLock::new(state),
        })
    }

    pub async fn register_ticket(&self, ticket_id: impl Into<String>, owner: TicketOwner) {
        let ticket_id = ticket_id.into();
        let mut state = self.state.write().await;
        if state.tickets.insert(ticket_id.clone(), owner).is_none() {
            state.ticket_order.push(ticket_id);
        }
    }

    /// Tickets registered for `project_id`, in registration order.
    pub async fn project_tickets(&self, project_id: &str) -> Vec<String> {
        let state = self.state.read().await;
        state
            .ticket_order
            .iter()
            .filter(|id| {
                state
                    .tickets
                    .get(*id)
                    .is_some_and(|o| o.project_id == project_id)
            })
            .cloned()
            .collect()
    }

    pub async fn snapshot(&self) -> GraphSnapshot {
        let state = self.state.read().await;
        GraphSnapshot {
            tickets: state
                .ticket_order
                .iter()
                .filter_map(|id| {
                    state
                        .tickets
                        .get(id)
                        .map(|owner| TicketRecord::new(id.clone(), owner.clone()))
                })
                .collect(),
            edges: state.edges.clone(),
        }
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn resolve_ticket(&self, ticket_id: &str) -> Result<Option<TicketOwner>, StoreError> {
        Ok(self.state.read().await.tickets.get(ticket_id).cloned())
    }

    async fn load_edges(&self, project_id: &str) -> Result<Vec<DependencyEdge>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .edges
            .iter()
            .filter(|e| e.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn edge_revision(&self, project_id: &str) -> Result<u64, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .revisions
            .get(project_id)
            .copied()
            .unwrap_or(0))
    }

    async fn replace_edges(
        &self,
        project_id: &str,
        ticket_id: &str,
        expected_revision: u64,
        edges: Vec<DependencyEdge>,
    ) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        let revision = state.revisions.entry(project_id.to_string()).or_insert(0);
        if *revision != expected_revision {
            return Err(StoreError::StaleRevision {
                project_id: project_id.to_string(),
                expected: expected_revision,
                actual: *revision,
            });
        }
        *revision += 1;
        let committed = *revision;

        state
            .edges
            .retain(|e| !(e.project_id == project_id && e.ticket_id == ticket_id));
        state.edges.extend(edges);
        Ok(committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticketflow_core::session::ScopeLevel;

    fn edge(t: &str, d: &str) -> DependencyEdge {
        DependencyEdge {
            ticket_id: t.into(),
            depends_on_ticket_id: d.into(),
            project_id: "p1".into(),
            scope_type: ScopeLevel::Project,
            scope_id: "p1".into(),
        }
    }

    #[tokio::test]
    async fn replace_edges_only_touches_one_ticket() {
        let store = InMemoryGraphStore::new();
        store
            .replace_edges("p1", "b", 0, vec![edge("b", "a")])
            .await
            .unwrap();
        store
            .replace_edges("p1", "c", 1, vec![edge("c", "a"), edge("c", "b")])
            .await
            .unwrap();
        store
            .replace_edges("p1", "c", 2, vec![edge("c", "b")])
            .await
            .unwrap();

        let edges = store.load_edges("p1").await.unwrap();
        assert_eq!(edges, vec![edge("b", "a"), edge("c", "b")]);
        assert!(store.load_edges("p2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stale_revision_writes_nothing() {
        let store = InMemoryGraphStore::new();
        let rev = store
            .replace_edges("p1", "b", 0, vec![edge("b", "a")])
            .await
            .unwrap();
        assert_eq!(rev, 1);
        assert_eq!(store.edge_revision("p1").await.unwrap(), 1);
        assert_eq!(store.edge_revision("p2").await.unwrap(), 0);

        let err = store
            .replace_edges("p1", "c", 0, vec![edge("c", "b")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::StaleRevision {
                expected: 0,
                actual: 1,
                ..
            }
        ));
        assert_eq!(store.load_edges("p1").await.unwrap(), vec![edge("b", "a")]);
        assert_eq!(store.edge_revision("p1").await.unwrap(), 1);
    }

    #[test]
    fn cyclic_snapshot_is_rejected() {
        let tickets = ["a", "b"]
            .iter()
            .map(|id| TicketRecord::new(id.to_string(), TicketOwner::project("p1")))
            .collect();
        let snapshot = GraphSnapshot {
            tickets,
            edges: vec![edge("b", "a"), edge("a", "b")],
        };
        let err = InMemoryGraphStore::from_snapshot(snapshot).err().unwrap();
        assert!(matches!(err, GraphError::Cycle { .. }));
    }

    #[test]
    fn snapshot_edges_must_reference_known_tickets() {
        let snapshot = GraphSnapshot {
            tickets: vec![TicketRecord::new("a".into(), TicketOwner::project("p1"))],
            edges: vec![edge("a", "ghost")],
        };
        let err = InMemoryGraphStore::from_snapshot(snapshot).err().unwrap();
        assert!(matches!(err, GraphError::TicketNotFound(id) if id == "ghost"));
    }

    #[tokio::test]
    async fn resolves_registered_tickets() {
        let store = InMemoryGraphStore::new();
        store.register_ticket("e1", TicketOwner::project("p1")).await;
        store.register_ticket("s1", TicketOwner::epic("p1", "e1")).await;
        store.register_ticket("x1", TicketOwner::project("p2")).await;

        assert_eq!(
            store.resolve_ticket_project("s1").await.unwrap().as_deref(),
            Some("p1")
        );
        assert_eq!(store.resolve_ticket("nope").await.unwrap(), None);
        assert_eq!(store.project_tickets("p1").await, vec!["e1", "s1"]);
    }
}
