use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::link::BusConnector;
use crate::reader::{InputReader, StdinLineSource};
use crate::{
    worker, BridgeError, ConnectionConfig, HandoffQueue, MessageEnvelope, WakeInjector, WorkerError,
};

/// Bounded wait for the worker to exit at shutdown. Exceeding it is logged,
/// never raised.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Liveness and captured failure of the worker thread, shared with the
/// submission path for the watchdog check.
#[derive(Debug)]
struct WorkerStatus {
    alive: AtomicBool,
    error: Mutex<Option<WorkerError>>,
}

impl WorkerStatus {
    fn new() -> Self {
        Self {
            alive: AtomicBool::new(true),
            error: Mutex::new(None),
        }
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    // Recorded before `mark_dead`, so a dead worker always has its error
    // visible to the watchdog.
    fn record(&self, err: WorkerError) {
        let mut slot = self.error.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(err);
    }

    fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    fn take_error(&self) -> Option<WorkerError> {
        self.error
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }
}

/// Context object tying the two execution contexts together: the handoff
/// queue, the wake injector and the worker thread's status. Constructed once
/// at startup; the reader side calls [`submit`](Bridge::submit), the shutdown
/// coordinator is [`shutdown`](Bridge::shutdown).
pub struct Bridge {
    queue: HandoffQueue,
    injector: Arc<WakeInjector>,
    status: Arc<WorkerStatus>,
    done_rx: mpsc::Receiver<()>,
    thread: JoinHandle<()>,
}

impl Bridge {
    /// Spawns the bus worker on a dedicated thread owning a current-thread
    /// tokio runtime, and returns the handle the synchronous side talks to.
    pub fn start<C: BusConnector>(
        config: ConnectionConfig,
        connector: C,
    ) -> Result<Self, BridgeError> {
        let queue = HandoffQueue::new();
        let injector = Arc::new(WakeInjector::new());
        let status = Arc::new(WorkerStatus::new());
        let (done_tx, done_rx) = mpsc::channel();

        let thread = {
            let queue = queue.clone();
            let injector = Arc::clone(&injector);
            let status = Arc::clone(&status);
            thread::Builder::new()
                .name("bus-worker".to_string())
                .spawn(move || {
                    let result = match tokio::runtime::Builder::new_current_thread()
                        .enable_time()
                        .build()
                    {
                        Ok(runtime) => {
                            runtime.block_on(worker::run(connector, config, queue, injector))
                        }
                        Err(err) => Err(WorkerError::Runtime(err.to_string())),
                    };
                    if let Err(err) = result {
                        warn!(error = %err, "bus worker terminated with error");
                        status.record(err);
                    }
                    status.mark_dead();
                    let _ = done_tx.send(());
                })
                .map_err(BridgeError::Spawn)?
        };

        Ok(Self {
            queue,
            injector,
            status,
            done_rx,
            thread,
        })
    }

    /// Hands one envelope to the worker and wakes it, once per batch.
    ///
    /// Watchdog on the submission path: a dead worker fails the call with its
    /// captured error instead of queueing work that will never be sent.
    pub fn submit(&self, envelope: MessageEnvelope) -> Result<(), BridgeError> {
        if !self.status.is_alive() {
            return Err(match self.status.take_error() {
                Some(err) => BridgeError::WorkerFailed(err),
                None => BridgeError::WorkerDied,
            });
        }
        self.queue.push(envelope);
        self.injector.wake_work();
        Ok(())
    }

    pub fn worker_alive(&self) -> bool {
        self.status.is_alive()
    }

    /// Envelopes queued but not yet transmitted.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Signals shutdown and waits up to `timeout` for the worker to exit. A
    /// worker that does not stop in time is left behind with a warning.
    /// Returns the worker's captured fatal error, if any.
    pub fn shutdown(self, timeout: Duration) -> Result<(), WorkerError> {
        debug!("requesting bus worker shutdown");
        self.injector.request_shutdown();
        match self.done_rx.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                let _ = self.thread.join();
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(?timeout, "bus worker did not stop within shutdown timeout");
                return Ok(());
            }
        }
        match self.status.take_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Full process wiring: read stdin in bounded batches on the calling thread,
/// forward through the bridge, run the shutdown coordinator at end-of-stream.
///
/// Standard output is flushed once per batch as the acknowledgment heartbeat
/// for the host runtime; no payload is written back.
pub fn run_forwarder<C: BusConnector>(
    config: ConnectionConfig,
    connector: C,
) -> Result<(), BridgeError> {
    let bridge = Bridge::start(config, connector)?;
    let source = StdinLineSource::spawn().map_err(BridgeError::Spawn)?;
    let mut reader = InputReader::new(source, std::io::stdout());
    let run_result = reader.run(&bridge);
    let shutdown_result = bridge.shutdown(SHUTDOWN_TIMEOUT);
    run_result?;
    shutdown_result.map_err(BridgeError::WorkerFailed)
}
