use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::MessageEnvelope;

/// Unbounded FIFO of pending envelopes, shared between the input reader and
/// the bus worker.
///
/// Single producer (the reader pushes), single consumer (the worker pops).
/// Items are never reordered.
#[derive(Debug, Clone, Default)]
pub struct HandoffQueue {
    inner: Arc<Mutex<VecDeque<MessageEnvelope>>>,
}

impl HandoffQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, envelope: MessageEnvelope) {
        self.lock().push_back(envelope);
    }

    pub fn pop(&self) -> Option<MessageEnvelope> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<MessageEnvelope>> {
        // A panic while holding the lock poisons it; the queue itself is
        // still consistent, so keep serving the inner value.
        self.inner.lock().unwrap_or_else(|err| err.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(line: &str) -> MessageEnvelope {
        MessageEnvelope::new(vec![line.to_string()])
    }

    #[test]
    fn pops_in_push_order() {
        let queue = HandoffQueue::new();
        queue.push(envelope("first"));
        queue.push(envelope("second"));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop(), Some(envelope("first")));
        assert_eq!(queue.pop(), Some(envelope("second")));
        assert_eq!(queue.pop(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn clones_share_the_same_backing_queue() {
        let queue = HandoffQueue::new();
        let other = queue.clone();
        queue.push(envelope("shared"));
        assert_eq!(other.pop(), Some(envelope("shared")));
    }
}
