use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;

use crate::ConfigError;

/// Environment variable naming a config file that takes precedence over the
/// fixed search path.
pub const CONF_ENV_VAR: &str = "BUS_BRIDGE_CONF";

const CONF_FILE_NAME: &str = "bus-bridge.conf";
const SYSTEM_CONF_DIR: &str = "/etc/rsyslog.d";
const DEFAULT_URL: &str = "amqp://localhost:5672";
const DEFAULT_TARGET: &str = "rsyslogd";

/// Transport-level error conditions escalated to termination rather than
/// treated as transient.
pub const DEFAULT_FATAL_CONDITIONS: &[&str] =
    &["amqp:unauthorized-access", "amqp:resource-limit-exceeded"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Resolved connection parameters, immutable after resolution and shared
/// read-only with the bus worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Bus addresses tried in order for failover.
    pub urls: Vec<String>,
    /// Destination address on the bus.
    pub target: String,
    pub credentials: Option<Credentials>,
    /// Frequency of transport liveness probing.
    pub heartbeat: Option<Duration>,
    pub fatal_conditions: Vec<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            urls: vec![DEFAULT_URL.to_string()],
            target: DEFAULT_TARGET.to_string(),
            credentials: None,
            heartbeat: None,
            fatal_conditions: DEFAULT_FATAL_CONDITIONS
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: String,
    /// Diagnostic log destination; stderr when unset, keeping stdout a pure
    /// acknowledgment channel.
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BridgeConfig {
    pub connection: ConnectionConfig,
    pub logging: LogSettings,
}

#[derive(Debug, Parser)]
#[command(
    name = "bus-bridge",
    about = "Send newline-delimited log records to TARGET via a message bus"
)]
struct Cli {
    /// Address of the message bus; accepts a comma-separated list used in
    /// order for failover.
    #[arg(long, default_value = DEFAULT_URL)]
    url: String,

    /// Name of the destination address on the bus.
    #[arg(value_name = "TARGET", default_value = DEFAULT_TARGET)]
    target: String,

    /// Desired frequency, in seconds, of heartbeats testing that the
    /// underlying socket is alive.
    #[arg(long)]
    heartbeat: Option<u64>,

    /// Username for SASL authentication.
    #[arg(long)]
    username: Option<String>,

    /// Path to a file holding the SASL password. A value starting with
    /// `pass:` embeds the remaining text as the password itself; that form
    /// leaves the password visible and is only meant for development.
    #[arg(long)]
    password_file: Option<String>,

    /// Level for internal diagnostic logging.
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Send internal log messages to a file instead of stderr.
    #[arg(long)]
    log_to_file: Option<PathBuf>,
}

/// Resolves configuration the way the host invokes us: CLI arguments when any
/// are present, otherwise the first readable config file.
pub fn resolve_config() -> Result<BridgeConfig, ConfigError> {
    resolve_from_args(std::env::args_os())
}

pub fn resolve_from_args<I, T>(args: I) -> Result<BridgeConfig, ConfigError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    if args.len() > 1 {
        from_cli(Cli::parse_from(args))
    } else {
        resolve_from_file_paths(&search_paths())
    }
}

/// The fixed config search path: the env override first, then the home file,
/// then the system drop-in directory.
fn search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(overridden) = std::env::var_os(CONF_ENV_VAR) {
        paths.push(PathBuf::from(overridden));
    }
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(CONF_FILE_NAME));
    }
    paths.push(Path::new(SYSTEM_CONF_DIR).join(CONF_FILE_NAME));
    paths
}

/// First readable file wins; unreadable entries are skipped.
pub fn resolve_from_file_paths(paths: &[PathBuf]) -> Result<BridgeConfig, ConfigError> {
    for path in paths {
        let Ok(contents) = fs::read_to_string(path) else {
            continue;
        };
        return from_file(path, &contents);
    }
    Err(ConfigError::NotFound)
}

fn from_cli(cli: Cli) -> Result<BridgeConfig, ConfigError> {
    let raw = RawOptions {
        url: Some(cli.url),
        target: Some(cli.target),
        heartbeat: cli.heartbeat.map(|h| h.to_string()),
        username: cli.username,
        password_file: cli.password_file,
        log_level: Some(cli.log_level),
        log_to_file: cli.log_to_file.map(|p| p.display().to_string()),
    };
    build(raw)
}

#[derive(Debug, Default)]
struct RawOptions {
    url: Option<String>,
    target: Option<String>,
    heartbeat: Option<String>,
    username: Option<String>,
    password_file: Option<String>,
    log_level: Option<String>,
    log_to_file: Option<String>,
}

fn from_file(path: &Path, contents: &str) -> Result<BridgeConfig, ConfigError> {
    let mut raw = RawOptions::default();
    for (index, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(ConfigError::Malformed {
                path: path.to_path_buf(),
                line: index + 1,
            });
        };
        let value = value.trim().to_string();
        match key.trim() {
            "url" => raw.url = Some(value),
            "target" => raw.target = Some(value),
            "heartbeat" => raw.heartbeat = Some(value),
            "username" => raw.username = Some(value),
            "password-file" => raw.password_file = Some(value),
            "log-level" => raw.log_level = Some(value),
            "log-to-file" => raw.log_to_file = Some(value),
            other => tracing::warn!(key = other, path = %path.display(), "unknown config key ignored"),
        }
    }
    build(raw)
}

fn build(raw: RawOptions) -> Result<BridgeConfig, ConfigError> {
    let url_value = raw.url.unwrap_or_else(|| DEFAULT_URL.to_string());
    let urls: Vec<String> = url_value
        .split(',')
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .collect();
    if urls.is_empty() {
        return Err(ConfigError::InvalidValue {
            key: "url",
            value: url_value,
        });
    }

    let heartbeat = match raw.heartbeat {
        None => None,
        Some(value) => {
            let seconds: u64 = value.parse().map_err(|_| ConfigError::InvalidValue {
                key: "heartbeat",
                value: value.clone(),
            })?;
            // A zero heartbeat means "disabled" for the host runtime.
            (seconds > 0).then(|| Duration::from_secs(seconds))
        }
    };

    let credentials = match raw.username {
        None => None,
        Some(username) => {
            let source = raw.password_file.ok_or(ConfigError::MissingPassword)?;
            Some(Credentials {
                username,
                password: read_password(&source)?,
            })
        }
    };

    Ok(BridgeConfig {
        connection: ConnectionConfig {
            urls,
            target: raw.target.unwrap_or_else(|| DEFAULT_TARGET.to_string()),
            credentials,
            heartbeat,
            fatal_conditions: DEFAULT_FATAL_CONDITIONS
                .iter()
                .map(|c| c.to_string())
                .collect(),
        },
        logging: LogSettings {
            level: raw.log_level.unwrap_or_else(|| "warn".to_string()),
            file: raw.log_to_file.map(PathBuf::from),
        },
    })
}

/// `pass:<literal>` embeds the password directly (development only);
/// otherwise the file's trimmed contents are the password.
fn read_password(source: &str) -> Result<String, ConfigError> {
    if let Some(literal) = source.strip_prefix("pass:") {
        return Ok(literal.to_string());
    }
    let path = PathBuf::from(source);
    let contents = fs::read_to_string(&path).map_err(|err| ConfigError::Password {
        path: path.clone(),
        source: err,
    })?;
    Ok(contents.trim_matches([' ', '\n', '\r']).to_string())
}
