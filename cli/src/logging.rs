use std::path::PathBuf;
use std::sync::OnceLock;

use ticketflow_core::config::LoggingConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// Install the global subscriber for one `ticketflow` invocation.
///
/// Ticket and session events go to stderr so stdout stays clean for `--json`.
/// With `logging.file` they are also appended to a daily-rotated
/// `ticketflow.log` under [`log_dir`].
pub fn init_tracing(logging: &LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }
    if !logging.console && !logging.file {
        return Err("logging disabled for both console and file".to_string());
    }

    let file_writer = if logging.file {
        let dir = log_dir(logging);
        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let (writer, guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "ticketflow.log"));
        let _ = LOG_GUARD.set(guard);
        Some(writer)
    } else {
        None
    };

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });
    let file_layer = file_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(env_filter(&logging.level)?)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| e.to_string())
}

/// `RUST_LOG` overrides the configured level.
fn env_filter(level: &str) -> Result<EnvFilter, String> {
    match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => Ok(EnvFilter::from_default_env()),
        _ => EnvFilter::try_new(level).map_err(|e| format!("invalid log level '{level}': {e}")),
    }
}

/// `logging.directory` when set, otherwise `<tmp>/ticketflow`.
pub fn log_dir(logging: &LoggingConfig) -> PathBuf {
    logging
        .directory
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("ticketflow"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_directory_falls_back_to_tmp() {
        let mut cfg = LoggingConfig {
            directory: Some("   ".into()),
            ..LoggingConfig::default()
        };
        assert_eq!(log_dir(&cfg), std::env::temp_dir().join("ticketflow"));

        cfg.directory = Some("/var/log/tf".into());
        assert_eq!(log_dir(&cfg), PathBuf::from("/var/log/tf"));
    }

    #[test]
    fn fully_disabled_outputs_are_refused() {
        let cfg = LoggingConfig {
            console: false,
            file: false,
            ..LoggingConfig::default()
        };
        assert!(init_tracing(&cfg).is_err());
    }
}
