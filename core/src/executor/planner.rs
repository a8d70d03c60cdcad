use crate::config::CyclePolicy;
use crate::error::PlanError;
use crate::graph::{topological_layers, DependencyGraph};

use super::types::{ExecutionPlan, TicketExecutionStatus};

/// Layer `ticket_ids` over `graph` and mark every requested ticket `pending`.
///
/// Tickets caught in a cycle inside the requested set are either left out of
/// every layer or reported as an error, depending on `policy`.
pub fn plan_from_graph(
    graph: &DependencyGraph,
    ticket_ids: &[String],
    policy: CyclePolicy,
) -> Result<ExecutionPlan, PlanError> {
    let layering = topological_layers(graph, ticket_ids);

    if !layering.excluded.is_empty() {
        match policy {
            CyclePolicy::Reject => {
                return Err(PlanError::CyclicSubset {
                    tickets: layering.excluded,
                })
            }
            CyclePolicy::Exclude => {
                tracing::warn!(
                    tickets = %layering.excluded.join(","),
                    "cyclic tickets left out of the execution plan"
                );
            }
        }
    }

    let ticket_status = ticket_ids
        .iter()
        .map(|id| (id.clone(), TicketExecutionStatus::Pending))
        .collect();

    tracing::debug!(
        layers = layering.layers.len(),
        tickets = ticket_ids.len(),
        "execution plan built"
    );

    Ok(ExecutionPlan {
        layers: layering.layers,
        ticket_status,
    })
}
