mod stdin;

use std::io::Write;
use std::time::Duration;

use tracing::debug;

use crate::{Bridge, BridgeError, MessageEnvelope};

pub use stdin::StdinLineSource;

/// Limits on one read batch: how long to wait when nothing is pending, and
/// how many lines to take before handing a batch over.
#[derive(Debug, Clone, Copy)]
pub struct ReaderConfig {
    pub poll_interval: Duration,
    pub max_batch_lines: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(750),
            max_batch_lines: 1024,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum PollOutcome {
    Line(String),
    TimedOut,
    Eof,
}

/// Source of newline-delimited records with a bounded readiness wait.
pub trait LineSource {
    /// Waits up to `timeout` for the next line.
    fn poll_line(&mut self, timeout: Duration) -> PollOutcome;

    /// Returns an immediately available line, or `TimedOut` without blocking.
    fn try_line(&mut self) -> PollOutcome;
}

/// Synchronous batch loop on the calling thread.
///
/// Waits a bounded interval for input, drains immediately-available lines up
/// to the batch cap, submits one envelope per non-empty batch and flushes the
/// acknowledgment sink once per batch.
pub struct InputReader<S: LineSource, W: Write> {
    source: S,
    ack: W,
    config: ReaderConfig,
}

impl<S: LineSource, W: Write> InputReader<S, W> {
    pub fn new(source: S, ack: W) -> Self {
        Self::with_config(source, ack, ReaderConfig::default())
    }

    pub fn with_config(source: S, ack: W, config: ReaderConfig) -> Self {
        Self {
            source,
            ack,
            config,
        }
    }

    /// Runs until end-of-stream. The first submission failure (worker death
    /// surfaced by the watchdog) aborts the loop and propagates.
    pub fn run(&mut self, bridge: &Bridge) -> Result<(), BridgeError> {
        let mut eof = false;
        while !eof {
            let mut batch: Vec<String> = Vec::new();
            match self.source.poll_line(self.config.poll_interval) {
                PollOutcome::TimedOut => continue,
                PollOutcome::Eof => eof = true,
                PollOutcome::Line(line) => {
                    batch.push(line);
                    while batch.len() < self.config.max_batch_lines {
                        match self.source.try_line() {
                            PollOutcome::Line(line) => batch.push(line),
                            PollOutcome::TimedOut => break,
                            PollOutcome::Eof => {
                                eof = true;
                                break;
                            }
                        }
                    }
                }
            }
            if !batch.is_empty() {
                debug!(lines = batch.len(), "batch read");
                bridge.submit(MessageEnvelope::new(batch))?;
                // The host runtime buffers; a timely flush is its ack framing.
                self.ack.flush().map_err(BridgeError::Ack)?;
            }
        }
        Ok(())
    }
}
