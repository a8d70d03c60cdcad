//! Dependency-aware scheduling of tickets onto guarded worker sessions.
//!
//! - [`graph`]: edge validation (ownership, acyclicity), cycle detection and
//!   topological layering.
//! - [`executor`]: execution plans and the layer-by-layer executor.
//! - [`session`]: worker-session lifecycle, per-scope guard and dispatch.

pub mod config;
pub mod error;
pub mod executor;
pub mod graph;
pub mod session;

pub use executor::{
    ExecutionEngine, ExecutionPlan, LaunchResult, LaunchStrategy, TicketExecutionStatus,
};
pub use graph::{DependencyEdge, DependencyValidator, GraphStore};
pub use session::{AgentSession, SessionDispatcher, SessionScope, SessionStatus, SessionStore};
