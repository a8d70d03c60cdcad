//! Scripted agent runner: outcomes come from a table instead of a process.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use ticketflow_core::session::{AgentRunner, AgentSession, RunOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedOutcome {
    Succeed,
    Fail(String),
    /// The runner itself errors (e.g. the worker could not be started).
    Error(String),
}

pub struct ScriptedRunner {
    outcomes: HashMap<String, ScriptedOutcome>,
    delay: Duration,
}

impl ScriptedRunner {
    /// Every ticket succeeds unless scripted otherwise.
    pub fn new() -> Self {
        Self {
            outcomes: HashMap::new(),
            delay: Duration::ZERO,
        }
    }

    pub fn with_outcome(mut self, ticket_id: impl Into<String>, outcome: ScriptedOutcome) -> Self {
        self.outcomes.insert(ticket_id.into(), outcome);
        self
    }

    pub fn failing<I, S>(mut self, ticket_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for id in ticket_ids {
            self.outcomes
                .insert(id.into(), ScriptedOutcome::Fail("scripted failure".into()));
        }
        self
    }

    /// Simulated work time per ticket.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl Default for ScriptedRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AgentRunner for ScriptedRunner {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn run(&self, session: &AgentSession, ticket_id: &str) -> Result<RunOutcome> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        tracing::debug!(ticket_id, session_id = %session.id, "scripted run");

        match self.outcomes.get(ticket_id) {
            None | Some(ScriptedOutcome::Succeed) => Ok(RunOutcome::success()),
            Some(ScriptedOutcome::Fail(msg)) => Ok(RunOutcome::failure(msg.clone())),
            Some(ScriptedOutcome::Error(msg)) => Err(anyhow::anyhow!(msg.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticketflow_core::session::SessionScope;

    #[tokio::test]
    async fn follows_script() {
        let runner = ScriptedRunner::new()
            .failing(["b"])
            .with_outcome("c", ScriptedOutcome::Error("no binary".into()));
        let session = AgentSession::queued(SessionScope::project("p1"));

        assert!(runner.run(&session, "a").await.unwrap().success);
        let failed = runner.run(&session, "b").await.unwrap();
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("scripted failure"));
        assert!(runner.run(&session, "c").await.is_err());
    }
}
