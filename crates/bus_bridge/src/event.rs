/// Sender link lifecycle, owned exclusively by the bus worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Active,
    Draining,
    Closed,
}

/// A notification consumed by the worker's state machine, tagged by origin.
///
/// Protocol-layer faults carry the remote condition string; the worker
/// classifies them as fatal or recoverable (transport faults consult the
/// configured fatal condition set, the other layers are always fatal).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    /// The sender link is established and credit-driven sends may begin.
    LinkReady,
    /// The peer granted more delivery credit.
    CreditGranted,
    /// The reader queued new envelopes.
    WorkAvailable,
    TransportFault { condition: String },
    ConnectionFault { condition: String },
    SessionFault { condition: String },
    LinkFault { condition: String },
    ShutdownRequested,
}
