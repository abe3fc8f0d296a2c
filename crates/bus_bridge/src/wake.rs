use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// Cross-thread signal from the synchronous reader side into the worker's
/// event loop.
///
/// Carries two things: a wake-up (new envelopes queued) and a single-fire
/// shutdown flag. `notify_one` stores at most one permit, so repeated wakes
/// with no intervening wait collapse into a single pass over the queue.
#[derive(Debug, Default)]
pub struct WakeInjector {
    notify: Notify,
    shutdown: AtomicBool,
}

impl WakeInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals that new work is queued. Callable from synchronous code.
    pub fn wake_work(&self) {
        self.notify.notify_one();
    }

    /// Requests worker shutdown. Returns `true` on the first call only.
    pub fn request_shutdown(&self) -> bool {
        let first = !self.shutdown.swap(true, Ordering::SeqCst);
        self.notify.notify_one();
        first
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Suspends until the next wake. The shutdown flag persists, so a missed
    /// notification is recovered on the worker's next loop iteration.
    pub async fn notified(&self) {
        self.notify.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutdown_fires_once() {
        let injector = WakeInjector::new();
        assert!(!injector.shutdown_requested());
        assert!(injector.request_shutdown());
        assert!(!injector.request_shutdown());
        assert!(injector.shutdown_requested());
    }

    #[tokio::test]
    async fn wake_before_wait_is_not_lost() {
        let injector = WakeInjector::new();
        injector.wake_work();
        // The stored permit completes the wait immediately.
        injector.notified().await;
    }
}
