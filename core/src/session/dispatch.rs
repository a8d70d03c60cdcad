//! Launch strategy that runs each ticket inside a guarded worker session.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use futures::FutureExt;

use super::guard::{insert_running_session_with_guard, GuardOutcome};
use super::lifecycle::transition_session;
use super::store::SessionStore;
use super::types::{AgentSession, SessionScope, SessionStatus};
use crate::error::LifecycleError;
use crate::executor::{panic_message, LaunchResult, LaunchStrategy};
use crate::graph::GraphStore;

/// How an external worker run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl RunOutcome {
    pub fn success() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// The external worker process. Spawning and supervising it is up to the
/// implementation.
#[async_trait]
pub trait AgentRunner: Send + Sync {
    fn name(&self) -> &str;
    async fn run(&self, session: &AgentSession, ticket_id: &str) -> anyhow::Result<RunOutcome>;
}

/// Maps a ticket to the scope its worker session locks.
#[async_trait]
pub trait TicketScopeResolver: Send + Sync {
    async fn scope_for(&self, ticket_id: &str) -> anyhow::Result<SessionScope>;
}

/// Resolves scopes from ticket ownership recorded in a [`GraphStore`].
pub struct GraphScopeResolver {
    store: Arc<dyn GraphStore>,
}

impl GraphScopeResolver {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TicketScopeResolver for GraphScopeResolver {
    async fn scope_for(&self, ticket_id: &str) -> anyhow::Result<SessionScope> {
        let owner = self
            .store
            .resolve_ticket(ticket_id)
            .await?
            .with_context(|| format!("ticket not found: {ticket_id}"))?;
        Ok(owner.session_scope(ticket_id))
    }
}

/// Reserves a scope, walks the session through `queued -> running -> done`
/// and hands the work to an [`AgentRunner`].
pub struct SessionDispatcher {
    sessions: Arc<dyn SessionStore>,
    runner: Arc<dyn AgentRunner>,
    resolver: Arc<dyn TicketScopeResolver>,
}

impl SessionDispatcher {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        runner: Arc<dyn AgentRunner>,
        resolver: Arc<dyn TicketScopeResolver>,
    ) -> Self {
        Self {
            sessions,
            runner,
            resolver,
        }
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// Record that a session was asked to stop. The running worker is not
    /// interrupted here.
    pub async fn cancel_session(
        &self,
        session_id: &str,
        reason: Option<String>,
    ) -> Result<AgentSession, LifecycleError> {
        transition_session(
            self.sessions.as_ref(),
            session_id,
            SessionStatus::Cancelled,
            reason,
        )
        .await
    }

    /// Move a reserved session to `running` and hand it to the runner. Runner
    /// errors and panics come back as a failed outcome.
    async fn run_reserved(
        &self,
        session: &AgentSession,
        ticket_id: &str,
    ) -> anyhow::Result<RunOutcome> {
        transition_session(
            self.sessions.as_ref(),
            &session.id,
            SessionStatus::Running,
            None,
        )
        .await?;
        tracing::info!(
            ticket_id,
            session_id = %session.id,
            runner = self.runner.name(),
            "worker started"
        );

        let outcome = match AssertUnwindSafe(self.runner.run(session, ticket_id))
            .catch_unwind()
            .await
        {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => RunOutcome::failure(format!("{err:#}")),
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                tracing::error!(
                    ticket_id,
                    session_id = %session.id,
                    panic = %msg,
                    "worker panicked"
                );
                RunOutcome::failure(format!("worker panicked: {msg}"))
            }
        };
        Ok(outcome)
    }

    async fn finish(
        &self,
        ticket_id: &str,
        session_id: &str,
        outcome: RunOutcome,
    ) -> anyhow::Result<LaunchResult> {
        let to = if outcome.success {
            SessionStatus::Completed
        } else {
            SessionStatus::Failed
        };

        match transition_session(self.sessions.as_ref(), session_id, to, outcome.error.clone())
            .await
        {
            Ok(_) => Ok(LaunchResult {
                ticket_id: ticket_id.to_string(),
                session_id: Some(session_id.to_string()),
                success: outcome.success,
                error: outcome.error,
            }),
            // Someone else already closed the session (e.g. a cancellation).
            Err(err @ LifecycleError::Conflict { .. }) => Ok(LaunchResult {
                ticket_id: ticket_id.to_string(),
                session_id: Some(session_id.to_string()),
                success: false,
                error: Some(err.to_string()),
            }),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl LaunchStrategy for SessionDispatcher {
    async fn launch(&self, ticket_id: &str) -> anyhow::Result<LaunchResult> {
        let scope = self.resolver.scope_for(ticket_id).await?;
        let session = AgentSession::queued(scope.clone()).with_ticket(ticket_id);

        let session =
            match insert_running_session_with_guard(self.sessions.as_ref(), &scope, session).await? {
                GuardOutcome::Reserved(session) => session,
                GuardOutcome::AlreadyRunning(conflict) => {
                    return Ok(LaunchResult::failed(ticket_id, conflict.to_string()));
                }
            };

        // From here on the session holds the scope; every path must end it.
        let outcome = match self.run_reserved(&session, ticket_id).await {
            Ok(outcome) => outcome,
            Err(err) => RunOutcome::failure(format!("{err:#}")),
        };
        self.finish(ticket_id, &session.id, outcome).await
    }
}
