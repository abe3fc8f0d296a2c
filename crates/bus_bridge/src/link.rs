use crate::{BusEvent, ConnectionConfig, MessageEnvelope, WorkerError};

/// Seam to the bus client library. The bridge never speaks the wire protocol
/// itself; an implementation of this pair of traits supplies connection
/// establishment, credit observation and message transmission.
///
/// URL failover order and authentication live behind `connect`; the bridge
/// passes the resolved [`ConnectionConfig`] through untouched.
#[allow(async_fn_in_trait)]
pub trait BusConnector: Send + 'static {
    type Link: SenderLink;

    async fn connect(&mut self, config: &ConnectionConfig) -> Result<Self::Link, WorkerError>;
}

/// An established unidirectional sender over the bus.
#[allow(async_fn_in_trait)]
pub trait SenderLink {
    /// Remaining delivery credit granted by the receiving peer.
    fn credit(&self) -> usize;

    /// Transmits one envelope. Only called while `credit() > 0`.
    async fn send(&mut self, envelope: MessageEnvelope) -> Result<(), WorkerError>;

    /// Next protocol notification (credit grants, faults). Futures returned
    /// here are dropped when the worker is woken for queued work, so
    /// implementations must not lose events across cancellation.
    async fn next_event(&mut self) -> BusEvent;

    /// Tears down the link and its connection. Best effort.
    async fn close(&mut self);
}
