//! Worker-session lifecycle and per-scope concurrency guard.
//!
//! Sessions start `queued`, move through guarded transitions and are
//! immutable once terminal. At most one active session may hold a scope;
//! project- and epic-wide sessions also block the stories beneath them.

pub mod dispatch;
pub mod guard;
pub mod lifecycle;
pub mod store;
pub mod types;

pub use dispatch::{
    AgentRunner, GraphScopeResolver, RunOutcome, SessionDispatcher, TicketScopeResolver,
};
pub use guard::{
    get_running_session_for_target, insert_running_session_with_guard, GuardConflict,
    GuardOutcome, GuardTarget,
};
pub use lifecycle::{build_session_transition_patch, transition_session, SessionLifecycle};
pub use store::{ConflictPredicate, SessionStore};
pub use types::{AgentSession, ScopeLevel, SessionScope, SessionStatus, SessionTransitionPatch};
