use std::path::PathBuf;

use thiserror::Error;

/// Startup-fatal configuration failures. The process does not attempt a
/// connection when resolution fails.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no configuration found (no CLI arguments and no readable config file)")]
    NotFound,
    #[error("malformed entry in {path} line {line}: expected key=value")]
    Malformed { path: PathBuf, line: usize },
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("username set but no password source provided")]
    MissingPassword,
    #[error("failed to read password file {path}: {source}")]
    Password {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Fatal conditions that terminate the bus worker's loop.
///
/// Connection, session and link faults reported by the remote peer are always
/// fatal; a transport fault is fatal only when its condition is in the
/// configured fatal set. The worker captures the error for the watchdog and
/// exits without reconnecting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerError {
    #[error("fatal transport error: {condition}")]
    Transport { condition: String },
    #[error("connection error reported by peer: {condition}")]
    Connection { condition: String },
    #[error("session error reported by peer: {condition}")]
    Session { condition: String },
    #[error("link error reported by peer: {condition}")]
    Link { condition: String },
    #[error("failed to establish bus connection: {0}")]
    Connect(String),
    #[error("worker runtime error: {0}")]
    Runtime(String),
}

/// Failures surfaced on the submission path or while wiring the bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The watchdog found the worker dead and propagates its captured error.
    #[error("bus worker failed: {0}")]
    WorkerFailed(#[from] WorkerError),
    /// The worker terminated without recording an error.
    #[error("bus worker terminated unexpectedly")]
    WorkerDied,
    #[error("failed to spawn thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("failed to flush acknowledgment stream: {0}")]
    Ack(#[source] std::io::Error),
}
