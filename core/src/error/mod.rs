pub mod graph;
pub mod session;
pub mod store;

pub use graph::{GraphError, PlanError};
pub use session::{GuardError, LifecycleError};
pub use store::StoreError;
