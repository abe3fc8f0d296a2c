#![forbid(unsafe_code)]
//! Bridge between a synchronous, line-oriented input stream and an
//! asynchronous, credit-flow-controlled message bus sender.
//!
//! The input reader runs on the calling thread and never blocks past a
//! bounded poll interval; the bus worker runs an event loop on a dedicated
//! thread and only transmits when the peer has granted delivery credit.
//! Between them sit the [`HandoffQueue`] (unbounded FIFO, no reordering, no
//! loss between hand-off and transmission) and the [`WakeInjector`] (one
//! cross-thread wake per batch). The wire protocol itself is out of scope:
//! implement [`BusConnector`]/[`SenderLink`] over a bus client library and
//! hand it to [`run_forwarder`] or [`Bridge::start`].

mod bridge;
mod config;
mod envelope;
mod error;
mod event;
mod link;
mod logging;
mod queue;
mod reader;
pub mod testing;
mod wake;
mod worker;

pub use bridge::{run_forwarder, Bridge, SHUTDOWN_TIMEOUT};
pub use config::{
    resolve_config, resolve_from_args, resolve_from_file_paths, BridgeConfig, ConnectionConfig,
    Credentials, LogSettings, CONF_ENV_VAR, DEFAULT_FATAL_CONDITIONS,
};
pub use envelope::MessageEnvelope;
pub use error::{BridgeError, ConfigError, WorkerError};
pub use event::{BusEvent, LinkState};
pub use link::{BusConnector, SenderLink};
pub use logging::init_logging;
pub use queue::HandoffQueue;
pub use reader::{InputReader, LineSource, PollOutcome, ReaderConfig, StdinLineSource};
pub use wake::WakeInjector;
