use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use ticketflow_core::config::AppConfig;
use ticketflow_core::error::GraphError;
use ticketflow_core::graph::{DependencyValidator, GraphStore};
use ticketflow_core::session::{AgentRunner, GraphScopeResolver, SessionDispatcher, SessionStore};
use ticketflow_core::ExecutionEngine;

use crate::graph::InMemoryGraphStore;
use crate::session::InMemorySessionStore;
use crate::snapshot::GraphSnapshot;

/// Concrete collaborators wired together for one process.
#[derive(Clone)]
pub struct Services {
    pub graph: Arc<InMemoryGraphStore>,
    pub sessions: Arc<InMemorySessionStore>,
}

impl Services {
    /// Fails when the snapshot's edges are not a valid DAG.
    pub fn in_memory(snapshot: GraphSnapshot) -> Result<Self, GraphError> {
        Ok(Self {
            graph: Arc::new(InMemoryGraphStore::from_snapshot(snapshot)?),
            sessions: Arc::new(InMemorySessionStore::new()),
        })
    }

    pub async fn from_snapshot_file(path: &Path) -> Result<Self> {
        Ok(Self::in_memory(GraphSnapshot::load(path).await?)?)
    }

    pub fn graph_store(&self) -> Arc<dyn GraphStore> {
        self.graph.clone()
    }

    pub fn session_store(&self) -> Arc<dyn SessionStore> {
        self.sessions.clone()
    }
}

pub fn build_validator(services: &Services) -> DependencyValidator {
    DependencyValidator::new(services.graph_store())
}

pub fn build_engine(services: &Services, cfg: &AppConfig) -> ExecutionEngine {
    ExecutionEngine::new(services.graph_store(), cfg.executor.clone())
}

pub fn build_dispatcher(services: &Services, runner: Arc<dyn AgentRunner>) -> SessionDispatcher {
    SessionDispatcher::new(
        services.session_store(),
        runner,
        Arc::new(GraphScopeResolver::new(services.graph_store())),
    )
}
