use thiserror::Error;

use ticketflow_core::error::{GraphError, PlanError, StoreError};

#[derive(Error, Debug)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(String),
    #[error("snapshot error: {0}")]
    Snapshot(String),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("command failed: {0}")]
    Command(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl CliError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Snapshot(_) => "SNAPSHOT_ERROR",
            Self::Graph(e) => e.code(),
            Self::Plan(e) => e.code(),
            Self::Store(e) => e.code(),
            Self::Command(_) | Self::Io(_) | Self::Anyhow(_) => "INTERNAL_ERROR",
        }
    }

    /// Process exit status for this error.
    // 2: validation or usage problem the caller can fix
    // 3: store / io / internal failure
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Snapshot(_) => 2,
            Self::Graph(e) if e.is_validation() => 2,
            Self::Plan(PlanError::CyclicSubset { .. }) => 2,
            Self::Graph(_) | Self::Plan(_) | Self::Store(_) => 3,
            Self::Command(_) | Self::Io(_) | Self::Anyhow(_) => 3,
        }
    }
}
