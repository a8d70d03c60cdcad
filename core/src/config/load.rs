use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Default data directory: ~/.ticketflow
pub fn get_data_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".ticketflow"))
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)?;
    let mut cfg = toml::from_str::<AppConfig>(&s)?;
    apply_env_overrides(&mut cfg)?;
    Ok(cfg)
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.ticketflow/config.toml
    let user_config = get_data_dir().ok().map(|d| d.join("config.toml"));

    // Priority 2: ./config.toml (current directory)
    let local_config = Path::new("config.toml");

    let mut cfg: AppConfig = match user_config.filter(|p| p.exists()) {
        Some(path) => toml::from_str(&std::fs::read_to_string(path)?)?,
        None if local_config.exists() => {
            toml::from_str(&std::fs::read_to_string(local_config)?)?
        }
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut cfg)?;
    Ok(cfg)
}

// Environment variable overrides (Priority 0: highest)
fn apply_env_overrides(cfg: &mut AppConfig) -> anyhow::Result<()> {
    if let Some(v) = non_empty_env("TICKETFLOW_MAX_PARALLEL") {
        let n: usize = v
            .parse()
            .map_err(|_| anyhow::anyhow!("TICKETFLOW_MAX_PARALLEL must be a number, got '{v}'"))?;
        cfg.executor.max_parallel = (n > 0).then_some(n);
    }
    if let Some(v) = non_empty_env("TICKETFLOW_CYCLE_POLICY") {
        cfg.executor.cycle_policy = v.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    }
    if let Some(v) = non_empty_env("TICKETFLOW_LOG_LEVEL") {
        cfg.logging.level = v;
    }
    Ok(())
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
