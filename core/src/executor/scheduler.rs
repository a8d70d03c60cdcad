use std::panic::AssertUnwindSafe;
use std::time::Instant;

use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use tokio::sync::Semaphore;

use super::traits::LaunchStrategy;
use super::types::{TicketExecutionStatus, TicketRun};

/// Launch every ticket of one layer concurrently and wait for all of them.
///
/// # Arguments
///
/// * `ticket_ids` - Eligible tickets of this layer
/// * `launcher` - External launch strategy
/// * `max_concurrency` - Maximum number of launches in flight
///
/// # Returns
///
/// One [`TicketRun`] per ticket, in completion order. Launch errors and panics
/// become `failed` runs.
pub async fn execute_layer_parallel(
    ticket_ids: &[String],
    launcher: &dyn LaunchStrategy,
    max_concurrency: usize,
) -> Vec<TicketRun> {
    let sem = Semaphore::new(max_concurrency.max(1));
    let mut futs: FuturesUnordered<_> = FuturesUnordered::new();

    for id in ticket_ids {
        let ticket_id = id.clone();
        let sem = &sem;

        futs.push(async move {
            let Ok(_permit) = sem.acquire().await else {
                return failed_run(ticket_id, "semaphore closed unexpectedly".into(), 0);
            };

            let start = Instant::now();
            let outcome = AssertUnwindSafe(async { launcher.launch(&ticket_id).await })
                .catch_unwind()
                .await;
            let duration_ms = start.elapsed().as_millis() as u64;

            match outcome {
                Ok(Ok(result)) => {
                    if result.ticket_id != ticket_id {
                        tracing::warn!(
                            ticket_id = %ticket_id,
                            reported = %result.ticket_id,
                            "launch result names a different ticket"
                        );
                    }
                    let status = if result.success {
                        TicketExecutionStatus::Done
                    } else {
                        TicketExecutionStatus::Failed
                    };
                    TicketRun {
                        ticket_id,
                        session_id: result.session_id,
                        status,
                        error: result.error,
                        duration_ms,
                    }
                }
                Ok(Err(err)) => failed_run(ticket_id, format!("{err:#}"), duration_ms),
                Err(panic) => failed_run(
                    ticket_id,
                    format!("launch panicked: {}", panic_message(panic.as_ref())),
                    duration_ms,
                ),
            }
        });
    }

    let mut runs = Vec::with_capacity(ticket_ids.len());
    while let Some(run) = futs.next().await {
        runs.push(run);
    }
    runs
}

fn failed_run(ticket_id: String, error: String, duration_ms: u64) -> TicketRun {
    TicketRun {
        ticket_id,
        session_id: None,
        status: TicketExecutionStatus::Failed,
        error: Some(error),
        duration_ms,
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
