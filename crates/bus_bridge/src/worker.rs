use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tracing::debug;

use crate::link::{BusConnector, SenderLink};
use crate::{BusEvent, ConnectionConfig, HandoffQueue, LinkState, WakeInjector, WorkerError};

/// Upper bound on one suspension inside the event loop, so the shutdown flag
/// is re-evaluated even when the link and the reader are both silent.
const LOOP_TIMEOUT: Duration = Duration::from_secs(2);

/// Bounded settle window after the shutdown signal is observed: in-flight
/// protocol work may finish, queued-but-unsent envelopes are dropped with the
/// process.
const SETTLE_ITERATIONS: usize = 8;
const SETTLE_WAIT: Duration = Duration::from_millis(250);

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Stop,
}

/// Owns the sender link lifecycle: observe credit, drain the handoff queue
/// when credit and items are both available, classify protocol faults, run
/// until told to stop.
pub(crate) struct BusWorker<L: SenderLink> {
    link: L,
    state: LinkState,
    queue: HandoffQueue,
    injector: Arc<WakeInjector>,
    fatal_conditions: Vec<String>,
}

/// Entry point for the worker thread's runtime. Connects, then loops over
/// link events and wake notifications until shutdown or a fatal fault.
pub(crate) async fn run<C: BusConnector>(
    mut connector: C,
    config: ConnectionConfig,
    queue: HandoffQueue,
    injector: Arc<WakeInjector>,
) -> Result<(), WorkerError> {
    debug!(urls = ?config.urls, target = %config.target, "connecting to bus");

    let link = {
        let connect = connector.connect(&config);
        tokio::pin!(connect);
        loop {
            if injector.shutdown_requested() {
                debug!("shutdown requested while connecting");
                return Ok(());
            }
            tokio::select! {
                result = &mut connect => break result?,
                _ = injector.notified() => {}
                _ = time::sleep(LOOP_TIMEOUT) => {}
            }
        }
    };

    let mut worker = BusWorker::new(link, queue, injector, config.fatal_conditions);
    let result = worker.event_loop().await;
    if result.is_ok() {
        worker.settle().await;
    }
    worker.link.close().await;
    worker.state = LinkState::Closed;
    debug!("bus worker stopped");
    result
}

impl<L: SenderLink> BusWorker<L> {
    pub(crate) fn new(
        link: L,
        queue: HandoffQueue,
        injector: Arc<WakeInjector>,
        fatal_conditions: Vec<String>,
    ) -> Self {
        Self {
            link,
            state: LinkState::Connecting,
            queue,
            injector,
            fatal_conditions,
        }
    }

    async fn event_loop(&mut self) -> Result<(), WorkerError> {
        self.step(BusEvent::LinkReady).await?;
        loop {
            if self.injector.shutdown_requested() && self.state != LinkState::Draining {
                self.step(BusEvent::ShutdownRequested).await?;
            }
            if self.state == LinkState::Draining {
                return Ok(());
            }
            let event = tokio::select! {
                event = self.link.next_event() => event,
                _ = self.injector.notified() => {
                    if self.injector.shutdown_requested() {
                        BusEvent::ShutdownRequested
                    } else {
                        BusEvent::WorkAvailable
                    }
                }
                _ = time::sleep(LOOP_TIMEOUT) => continue,
            };
            if self.step(event).await? == Flow::Stop {
                return Ok(());
            }
        }
    }

    /// Applies one event to the link state machine. Every transition flows
    /// through here; fatal classifications surface as `Err`.
    pub(crate) async fn step(&mut self, event: BusEvent) -> Result<Flow, WorkerError> {
        match event {
            BusEvent::LinkReady => {
                debug!("sender link active");
                self.state = LinkState::Active;
                self.drain().await?;
                Ok(Flow::Continue)
            }
            BusEvent::CreditGranted | BusEvent::WorkAvailable => {
                if self.state == LinkState::Active {
                    self.drain().await?;
                }
                Ok(Flow::Continue)
            }
            BusEvent::TransportFault { condition } => {
                if self.fatal_conditions.iter().any(|fatal| fatal == &condition) {
                    self.state = LinkState::Closed;
                    return Err(WorkerError::Transport { condition });
                }
                debug!(%condition, "recoverable transport error");
                Ok(Flow::Continue)
            }
            BusEvent::ConnectionFault { condition } => {
                self.state = LinkState::Closed;
                Err(WorkerError::Connection { condition })
            }
            BusEvent::SessionFault { condition } => {
                self.state = LinkState::Closed;
                Err(WorkerError::Session { condition })
            }
            BusEvent::LinkFault { condition } => {
                self.state = LinkState::Closed;
                Err(WorkerError::Link { condition })
            }
            BusEvent::ShutdownRequested => {
                debug!("shutdown requested, draining");
                self.state = LinkState::Draining;
                Ok(Flow::Stop)
            }
        }
    }

    /// Central backpressure rule: transmit only while the peer has granted
    /// credit and the queue holds envelopes. Never drops for lack of credit.
    async fn drain(&mut self) -> Result<(), WorkerError> {
        let mut sent = 0usize;
        while self.link.credit() > 0 {
            let Some(envelope) = self.queue.pop() else {
                break;
            };
            self.link.send(envelope).await?;
            sent += 1;
        }
        if sent > 0 {
            debug!(sent, "envelopes transmitted");
        }
        Ok(())
    }

    /// Lets in-flight protocol work settle after shutdown was observed. No
    /// new sends happen here; faults at this point only get logged.
    async fn settle(&mut self) {
        for _ in 0..SETTLE_ITERATIONS {
            match time::timeout(SETTLE_WAIT, self.link.next_event()).await {
                Ok(BusEvent::TransportFault { condition })
                | Ok(BusEvent::ConnectionFault { condition })
                | Ok(BusEvent::SessionFault { condition })
                | Ok(BusEvent::LinkFault { condition }) => {
                    debug!(%condition, "fault while draining, ignored");
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }
    }

    #[cfg(test)]
    fn state(&self) -> LinkState {
        self.state
    }
}
