//! Graceful shutdown signal handling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

/// A clonable signal coordinating shutdown across tasks.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    triggered: Arc<AtomicBool>,
    sender: broadcast::Sender<()>,
}

impl ShutdownSignal {
    /// Creates a signal that must be triggered programmatically.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self {
            triggered: Arc::new(AtomicBool::new(false)),
            sender,
        }
    }

    /// Creates a signal wired to SIGINT (ctrl-c).
    #[must_use]
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        let trigger = signal.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                trigger.trigger();
            }
        });
        signal
    }

    /// Triggers the signal; idempotent.
    pub fn trigger(&self) {
        if self
            .triggered
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let _ = self.sender.send(());
        }
    }

    /// Whether shutdown has been triggered.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Resolves once the signal is triggered.
    pub async fn recv(&self) {
        if self.is_shutdown() {
            return;
        }
        let mut receiver = self.sender.subscribe();
        // A racing trigger between the check above and subscribing is
        // caught by re-checking the flag.
        if self.is_shutdown() {
            return;
        }
        let _ = receiver.recv().await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks in-flight connections for the drain phase of shutdown.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active: Arc<std::sync::atomic::AtomicUsize>,
    notify: Arc<tokio::sync::Notify>,
}

impl ConnectionTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection; dropping the token deregisters it.
    #[must_use]
    pub fn acquire(&self) -> ConnectionToken {
        self.active.fetch_add(1, Ordering::SeqCst);
        ConnectionToken {
            active: Arc::clone(&self.active),
            notify: Arc::clone(&self.notify),
        }
    }

    /// Number of connections currently in flight.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Resolves once no connections are in flight.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.notify.notified();
            if self.active_connections() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Token representing one tracked connection.
#[derive(Debug)]
pub struct ConnectionToken {
    active: Arc<std::sync::atomic::AtomicUsize>,
    notify: Arc<tokio::sync::Notify>,
}

impl Drop for ConnectionToken {
    fn drop(&mut self) {
        if self.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.notify.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_releases_waiters() {
        let signal = ShutdownSignal::new();
        let waiter = signal.clone();

        let handle = tokio::spawn(async move { waiter.recv().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        signal.trigger();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_recv_after_trigger_returns_immediately() {
        let signal = ShutdownSignal::new();
        signal.trigger();
        assert!(signal.is_shutdown());
        signal.recv().await;
    }

    #[test]
    fn test_trigger_is_idempotent() {
        let signal = ShutdownSignal::new();
        signal.trigger();
        signal.trigger();
        assert!(signal.is_shutdown());
    }

    #[tokio::test]
    async fn test_tracker_counts_tokens() {
        let tracker = ConnectionTracker::new();
        assert_eq!(tracker.active_connections(), 0);

        let token = tracker.acquire();
        assert_eq!(tracker.active_connections(), 1);
        drop(token);
        assert_eq!(tracker.active_connections(), 0);
    }

    #[tokio::test]
    async fn test_wait_idle_resolves_after_last_drop() {
        let tracker = ConnectionTracker::new();
        let token = tracker.acquire();

        let waiter = tracker.clone();
        let handle = tokio::spawn(async move { waiter.wait_idle().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(token);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
