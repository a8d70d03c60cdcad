use std::path::{Path, PathBuf};

use ticketflow_core::config::{self, AppConfig};
use ticketflow_plugins::{GraphSnapshot, Services};

use crate::error::CliError;

/// Config plus the collaborators loaded from the snapshot file.
pub struct CommandContext {
    pub cfg: AppConfig,
    pub services: Services,
    pub snapshot_path: PathBuf,
}

impl CommandContext {
    pub async fn load(cfg: AppConfig, snapshot: Option<&Path>) -> Result<Self, CliError> {
        let snapshot_path = match snapshot {
            Some(p) => p.to_path_buf(),
            None => config::get_data_dir()
                .map_err(|e| CliError::Config(e.to_string()))?
                .join("graph.json"),
        };

        let snapshot = GraphSnapshot::load(&snapshot_path)
            .await
            .map_err(|e| CliError::Snapshot(format!("{e:#}")))?;
        let services = Services::in_memory(snapshot)?;
        tracing::debug!(snapshot = %snapshot_path.display(), "snapshot loaded");

        Ok(Self {
            cfg,
            services,
            snapshot_path,
        })
    }

    pub async fn persist(&self) -> Result<(), CliError> {
        let snapshot: GraphSnapshot = self.services.graph.snapshot().await;
        snapshot
            .save(&self.snapshot_path)
            .await
            .map_err(|e| CliError::Snapshot(format!("{e:#}")))
    }
}
