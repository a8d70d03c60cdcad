use async_trait::async_trait;

use super::types::{LaunchResult, TicketExecutionStatus};

/// Starts the external work for one ticket and reports how it ended.
///
/// An `Err` (or a panic) is recorded as a failed ticket; it never aborts the
/// rest of the plan.
#[async_trait]
pub trait LaunchStrategy: Send + Sync {
    async fn launch(&self, ticket_id: &str) -> anyhow::Result<LaunchResult>;
}

/// Receives every per-ticket status change during execution.
pub trait StatusObserver: Send + Sync {
    fn on_status_change(&self, ticket_id: &str, status: TicketExecutionStatus);
}

impl<F> StatusObserver for F
where
    F: Fn(&str, TicketExecutionStatus) + Send + Sync,
{
    fn on_status_change(&self, ticket_id: &str, status: TicketExecutionStatus) {
        self(ticket_id, status)
    }
}
