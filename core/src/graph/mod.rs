//! Ticket dependency graph: validation, cycle detection and layering.
//!
//! ```text
//! GraphStore::load_edges()
//!   ↓
//! DependencyGraph::from_edges() → { edges, reverse_edges }
//!   ↓
//! detect_cycle()          (writes: DependencyValidator)
//! topological_layers()    (reads: ExecutionPlanner)
//! ```

mod cycle;
mod layering;
mod store;
mod types;
mod validator;

pub use cycle::detect_cycle;
pub use layering::{topological_layers, Layering};
pub use store::GraphStore;
pub use types::{DependencyEdge, DependencyGraph, TicketOwner};
pub use validator::{validate_edge_set, DependencyValidator};
