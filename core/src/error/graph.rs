use thiserror::Error;

use super::store::StoreError;

/// Errors raised while validating dependency edges. Nothing is committed when
/// one of these is returned.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("ticket '{ticket_id}' cannot depend on itself")]
    SelfReference { ticket_id: String },

    #[error("dependency cycle detected: {}", .path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error(
        "cross-project dependency: '{ticket_id}' -> '{depends_on_ticket_id}' \
         ('{offending_ticket_id}' belongs to '{found_project_id}', expected '{expected_project_id}')"
    )]
    CrossProject {
        ticket_id: String,
        depends_on_ticket_id: String,
        offending_ticket_id: String,
        expected_project_id: String,
        found_project_id: String,
    },

    #[error("ticket not found: {0}")]
    TicketNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl GraphError {
    /// Stable machine-readable code for callers that map errors to responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SelfReference { .. } => "DEPENDENCY_SELF_REFERENCE",
            Self::Cycle { .. } => "DEPENDENCY_CYCLE",
            Self::CrossProject { .. } => "DEPENDENCY_CROSS_PROJECT",
            Self::TicketNotFound(_) => "TICKET_NOT_FOUND",
            Self::Store(e) => e.code(),
        }
    }

    /// True for errors the caller caused (as opposed to store failures).
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::Store(_))
    }
}

/// Errors raised while building an execution plan.
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("requested tickets contain a dependency cycle: {}", .tickets.join(", "))]
    CyclicSubset { tickets: Vec<String> },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PlanError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::CyclicSubset { .. } => "DEPENDENCY_CYCLE",
            Self::Store(e) => e.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_lists_path() {
        let err = GraphError::Cycle {
            path: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "dependency cycle detected: a -> b -> a");
        assert_eq!(err.code(), "DEPENDENCY_CYCLE");
        assert!(err.is_validation());
    }

    #[test]
    fn store_errors_keep_their_code() {
        let err = GraphError::from(StoreError::Backend(anyhow::anyhow!("disk full")));
        assert_eq!(err.code(), "STORE_ERROR");
        assert!(!err.is_validation());
    }
}
