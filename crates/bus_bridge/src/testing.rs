//! In-memory scripted bus client, used by the crate's tests and examples.
//!
//! [`ScriptedBus`] is the test-side handle: grant credit, inject protocol
//! events, inspect transmitted envelopes. [`ScriptedConnector`] /
//! [`ScriptedLink`] are the matching [`BusConnector`] / [`SenderLink`]
//! implementations handed to the bridge.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::Notify;

use crate::link::{BusConnector, SenderLink};
use crate::{BusEvent, ConnectionConfig, MessageEnvelope, WorkerError};

#[derive(Debug, Default)]
struct Shared {
    credit: Mutex<usize>,
    sent: Mutex<Vec<MessageEnvelope>>,
    events: Mutex<VecDeque<BusEvent>>,
    notify: Notify,
    closed: AtomicBool,
}

/// Test-side handle for driving and observing the scripted link.
#[derive(Debug, Clone, Default)]
pub struct ScriptedBus {
    shared: Arc<Shared>,
}

impl ScriptedBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants `n` units of delivery credit and notifies the link.
    pub fn grant_credit(&self, n: usize) {
        {
            let mut credit = self.shared.credit.lock().unwrap();
            *credit += n;
        }
        self.push_event(BusEvent::CreditGranted);
    }

    /// Queues a protocol event for the link to observe.
    pub fn inject(&self, event: BusEvent) {
        self.push_event(event);
    }

    /// Envelopes transmitted so far, in send order.
    pub fn sent(&self) -> Vec<MessageEnvelope> {
        self.shared.sent.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    pub fn connector(&self) -> ScriptedConnector {
        ScriptedConnector {
            bus: self.clone(),
            connect_error: None,
            block_connect_for: None,
        }
    }

    pub(crate) fn link(&self) -> ScriptedLink {
        ScriptedLink {
            shared: Arc::clone(&self.shared),
        }
    }

    fn push_event(&self, event: BusEvent) {
        self.shared.events.lock().unwrap().push_back(event);
        self.shared.notify.notify_one();
    }
}

#[derive(Debug)]
pub struct ScriptedConnector {
    bus: ScriptedBus,
    connect_error: Option<WorkerError>,
    block_connect_for: Option<Duration>,
}

impl ScriptedConnector {
    /// A connector whose `connect` fails with the given error.
    pub fn failing(err: WorkerError) -> Self {
        Self {
            bus: ScriptedBus::new(),
            connect_error: Some(err),
            block_connect_for: None,
        }
    }

    /// A connector that blocks the worker thread inside `connect`, simulating
    /// a worker that never observes the stop signal.
    pub fn stuck_for(duration: Duration) -> Self {
        Self {
            bus: ScriptedBus::new(),
            connect_error: None,
            block_connect_for: Some(duration),
        }
    }
}

impl BusConnector for ScriptedConnector {
    type Link = ScriptedLink;

    async fn connect(&mut self, _config: &ConnectionConfig) -> Result<ScriptedLink, WorkerError> {
        if let Some(duration) = self.block_connect_for {
            // Deliberately blocks the runtime thread.
            std::thread::sleep(duration);
        }
        if let Some(err) = self.connect_error.take() {
            return Err(err);
        }
        Ok(self.bus.link())
    }
}

#[derive(Debug)]
pub struct ScriptedLink {
    shared: Arc<Shared>,
}

impl SenderLink for ScriptedLink {
    fn credit(&self) -> usize {
        *self.shared.credit.lock().unwrap()
    }

    async fn send(&mut self, envelope: MessageEnvelope) -> Result<(), WorkerError> {
        {
            let mut credit = self.shared.credit.lock().unwrap();
            *credit = credit.saturating_sub(1);
        }
        self.shared.sent.lock().unwrap().push(envelope);
        Ok(())
    }

    async fn next_event(&mut self) -> BusEvent {
        // Re-checks the queue before every wait, so events injected while no
        // waiter was registered are picked up on the next call.
        loop {
            if let Some(event) = self.shared.events.lock().unwrap().pop_front() {
                return event;
            }
            self.shared.notify.notified().await;
        }
    }

    async fn close(&mut self) {
        self.shared.closed.store(true, Ordering::SeqCst);
    }
}

/// Polls `cond` until it holds or a five second deadline passes.
///
/// # Panics
/// Panics with `what` on timeout.
pub fn wait_until(what: &str, cond: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!("timed out waiting for {what}");
}
