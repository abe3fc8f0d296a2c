use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::{ConfigError, LogSettings};

/// Installs the global tracing subscriber per the resolved log settings.
///
/// Diagnostics go to stderr unless a log file was configured; stdout is
/// reserved for the host runtime's acknowledgment framing.
pub fn init_logging(settings: &LogSettings) -> Result<(), ConfigError> {
    let level = normalize_level(&settings.level)?;
    let filter = EnvFilter::new(level);
    match &settings.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| ConfigError::LogFile {
                    path: path.clone(),
                    source,
                })?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

/// Accepts both tracing-style and syslog-style level names.
fn normalize_level(level: &str) -> Result<&'static str, ConfigError> {
    match level.to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" | "critical" => Ok("error"),
        other => Err(ConfigError::InvalidValue {
            key: "log-level",
            value: other.to_string(),
        }),
    }
}
