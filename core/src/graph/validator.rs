//! Acyclicity and ownership checks in front of every edge mutation.

use std::collections::HashSet;
use std::sync::Arc;

use super::cycle::detect_cycle;
use super::store::GraphStore;
use super::types::{DependencyEdge, DependencyGraph};
use crate::error::{GraphError, StoreError};

/// Commits are optimistic: a write that lost a race is re-validated against
/// the new edge set this many times before giving up.
const MAX_COMMIT_ATTEMPTS: usize = 8;

pub struct DependencyValidator {
    store: Arc<dyn GraphStore>,
}

impl DependencyValidator {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    /// Every endpoint of `edges` must belong to `project_id`. Fails on the
    /// first offending edge.
    pub async fn validate_same_project(
        &self,
        project_id: &str,
        edges: &[DependencyEdge],
    ) -> Result<(), GraphError> {
        for edge in edges {
            for endpoint in [&edge.ticket_id, &edge.depends_on_ticket_id] {
                let owner = self
                    .store
                    .resolve_ticket_project(endpoint)
                    .await?
                    .ok_or_else(|| GraphError::TicketNotFound(endpoint.clone()))?;

                if owner != project_id {
                    return Err(GraphError::CrossProject {
                        ticket_id: edge.ticket_id.clone(),
                        depends_on_ticket_id: edge.depends_on_ticket_id.clone(),
                        offending_ticket_id: endpoint.clone(),
                        expected_project_id: project_id.to_string(),
                        found_project_id: owner,
                    });
                }
            }
        }
        Ok(())
    }

    /// Overlay `new_edges` on the committed graph and reject any cycle.
    pub async fn validate_dag_integrity(
        &self,
        project_id: &str,
        new_edges: &[DependencyEdge],
    ) -> Result<(), GraphError> {
        let mut edges = self.store.load_edges(project_id).await?;
        edges.extend(new_edges.iter().cloned());
        ensure_acyclic(&edges)
    }

    /// Replace all predecessors of `ticket_id` with `depends_on_ids`.
    ///
    /// Self-reference is rejected before ownership and cycle checks. Nothing
    /// is written unless every check passes.
    pub async fn set_ticket_dependencies(
        &self,
        project_id: &str,
        ticket_id: &str,
        depends_on_ids: &[String],
    ) -> Result<Vec<DependencyEdge>, GraphError> {
        if depends_on_ids.iter().any(|id| id == ticket_id) {
            return Err(GraphError::SelfReference {
                ticket_id: ticket_id.to_string(),
            });
        }

        let owner = self
            .store
            .resolve_ticket(ticket_id)
            .await?
            .ok_or_else(|| GraphError::TicketNotFound(ticket_id.to_string()))?;

        let mut seen = HashSet::new();
        let candidates: Vec<DependencyEdge> = depends_on_ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .map(|dep| DependencyEdge {
                ticket_id: ticket_id.to_string(),
                depends_on_ticket_id: dep.clone(),
                project_id: project_id.to_string(),
                scope_type: owner.scope_type,
                scope_id: owner.scope_id.clone(),
            })
            .collect();

        if owner.project_id != project_id {
            return Err(GraphError::CrossProject {
                ticket_id: ticket_id.to_string(),
                depends_on_ticket_id: candidates
                    .first()
                    .map(|e| e.depends_on_ticket_id.clone())
                    .unwrap_or_default(),
                offending_ticket_id: ticket_id.to_string(),
                expected_project_id: project_id.to_string(),
                found_project_id: owner.project_id,
            });
        }
        self.validate_same_project(project_id, &candidates).await?;

        let mut attempt = 1;
        loop {
            let revision = self.store.edge_revision(project_id).await?;
            let mut overlay: Vec<DependencyEdge> = self
                .store
                .load_edges(project_id)
                .await?
                .into_iter()
                .filter(|e| e.ticket_id != ticket_id)
                .collect();
            overlay.extend(candidates.iter().cloned());
            ensure_acyclic(&overlay)?;

            match self
                .store
                .replace_edges(project_id, ticket_id, revision, candidates.clone())
                .await
            {
                Ok(committed) => {
                    tracing::info!(
                        project_id,
                        ticket_id,
                        dependencies = candidates.len(),
                        revision = committed,
                        "ticket dependencies replaced"
                    );
                    return Ok(candidates);
                }
                Err(StoreError::StaleRevision { actual, .. }) if attempt < MAX_COMMIT_ATTEMPTS => {
                    tracing::debug!(
                        project_id,
                        ticket_id,
                        expected = revision,
                        actual,
                        attempt,
                        "edge set changed during validation, retrying"
                    );
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Committed predecessors of `ticket_id`.
    pub async fn get_ticket_dependencies(
        &self,
        project_id: &str,
        ticket_id: &str,
    ) -> Result<Vec<DependencyEdge>, GraphError> {
        Ok(self
            .store
            .load_edges(project_id)
            .await?
            .into_iter()
            .filter(|e| e.ticket_id == ticket_id)
            .collect())
    }

    /// Committed edges pointing at `ticket_id`.
    pub async fn get_ticket_dependents(
        &self,
        project_id: &str,
        ticket_id: &str,
    ) -> Result<Vec<DependencyEdge>, GraphError> {
        Ok(self
            .store
            .load_edges(project_id)
            .await?
            .into_iter()
            .filter(|e| e.depends_on_ticket_id == ticket_id)
            .collect())
    }
}

/// Check an edge set that did not come through [`DependencyValidator`], such
/// as one read back from a file. `project_of` maps a ticket id to its project.
pub fn validate_edge_set<F>(edges: &[DependencyEdge], project_of: F) -> Result<(), GraphError>
where
    F: Fn(&str) -> Option<String>,
{
    for edge in edges {
        if edge.ticket_id == edge.depends_on_ticket_id {
            return Err(GraphError::SelfReference {
                ticket_id: edge.ticket_id.clone(),
            });
        }
        for endpoint in [&edge.ticket_id, &edge.depends_on_ticket_id] {
            let found = project_of(endpoint)
                .ok_or_else(|| GraphError::TicketNotFound(endpoint.clone()))?;
            if found != edge.project_id {
                return Err(GraphError::CrossProject {
                    ticket_id: edge.ticket_id.clone(),
                    depends_on_ticket_id: edge.depends_on_ticket_id.clone(),
                    offending_ticket_id: endpoint.clone(),
                    expected_project_id: edge.project_id.clone(),
                    found_project_id: found,
                });
            }
        }
    }
    ensure_acyclic(edges)
}

fn ensure_acyclic(edges: &[DependencyEdge]) -> Result<(), GraphError> {
    let graph = DependencyGraph::from_edges(edges);
    match detect_cycle(&graph) {
        Some(path) => {
            tracing::warn!(cycle = %path.join(" -> "), "rejected dependency cycle");
            Err(GraphError::Cycle { path })
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ScopeLevel;

    fn edge(project: &str, t: &str, d: &str) -> DependencyEdge {
        DependencyEdge {
            ticket_id: t.into(),
            depends_on_ticket_id: d.into(),
            project_id: project.into(),
            scope_type: ScopeLevel::Project,
            scope_id: project.into(),
        }
    }

    fn project_of(id: &str) -> Option<String> {
        match id {
            "a" | "b" | "c" => Some("p1".into()),
            "x" => Some("p2".into()),
            _ => None,
        }
    }

    #[test]
    fn loaded_edge_set_must_be_a_dag() {
        let ok = [edge("p1", "b", "a"), edge("p1", "c", "b")];
        assert!(validate_edge_set(&ok, project_of).is_ok());

        let cyclic = [
            edge("p1", "b", "a"),
            edge("p1", "c", "b"),
            edge("p1", "a", "c"),
        ];
        match validate_edge_set(&cyclic, project_of).unwrap_err() {
            GraphError::Cycle { path } => assert_eq!(path.len(), 3),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn loaded_edge_set_checks_ownership() {
        let err = validate_edge_set(&[edge("p1", "a", "a")], project_of).unwrap_err();
        assert!(matches!(err, GraphError::SelfReference { .. }));

        let err = validate_edge_set(&[edge("p1", "a", "x")], project_of).unwrap_err();
        match err {
            GraphError::CrossProject {
                offending_ticket_id,
                found_project_id,
                ..
            } => {
                assert_eq!(offending_ticket_id, "x");
                assert_eq!(found_project_id, "p2");
            }
            other => panic!("expected cross-project, got {other:?}"),
        }

        let err = validate_edge_set(&[edge("p1", "a", "ghost")], project_of).unwrap_err();
        assert!(matches!(err, GraphError::TicketNotFound(id) if id == "ghost"));
    }
}
