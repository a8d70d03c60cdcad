use async_trait::async_trait;

use super::types::{DependencyEdge, TicketOwner};
use crate::error::StoreError;

/// Dependency edge persistence collaborator.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn resolve_ticket(&self, ticket_id: &str) -> Result<Option<TicketOwner>, StoreError>;

    async fn resolve_ticket_project(&self, ticket_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self.resolve_ticket(ticket_id).await?.map(|o| o.project_id))
    }

    async fn load_edges(&self, project_id: &str) -> Result<Vec<DependencyEdge>, StoreError>;

    /// Revision of the project's edge set. Bumped by every successful
    /// `replace_edges`.
    async fn edge_revision(&self, project_id: &str) -> Result<u64, StoreError>;

    /// Replace every edge whose `ticket_id` is `ticket_id` with `edges`, as one
    /// transaction, provided the project is still at `expected_revision`.
    /// Otherwise nothing is written and [`StoreError::StaleRevision`] is
    /// returned.
    async fn replace_edges(
        &self,
        project_id: &str,
        ticket_id: &str,
        expected_revision: u64,
        edges: Vec<DependencyEdge>,
    ) -> Result<u64, StoreError>;
}
