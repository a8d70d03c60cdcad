//! Layered execution of ticket dependency plans.
//!
//! # Architecture
//!
//! ```text
//! ticket ids
//!   ↓
//! ExecutionEngine::build_execution_plan() → ExecutionPlan { layers, ticketStatus }
//!   ↓
//! ExecutionEngine::execute_dag_plan()
//!   ├─ per layer: skip tickets whose predecessor failed or was skipped
//!   └─ execute_layer_parallel() → LaunchStrategy::launch() for the rest
//!   ↓
//! { ticket_id → done | failed | skipped | pending }
//! ```

mod engine;
mod planner;
mod scheduler;
pub mod traits;
pub mod types;

pub use engine::{execute_plan, ExecutionEngine};
pub use planner::plan_from_graph;
pub(crate) use scheduler::panic_message;
pub use scheduler::execute_layer_parallel;
pub use traits::{LaunchStrategy, StatusObserver};
pub use types::{ExecutionPlan, ExecutionReport, LaunchResult, TicketExecutionStatus, TicketRun};
