pub mod factory;
pub mod graph;
pub mod runner;
pub mod session;
pub mod snapshot;

pub use factory::Services;
pub use graph::InMemoryGraphStore;
pub use runner::{ScriptedOutcome, ScriptedRunner};
pub use session::InMemorySessionStore;
pub use snapshot::{GraphSnapshot, TicketRecord};
