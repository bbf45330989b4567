//! Readiness gate for the one-time load flow.
//!
//! The load flow may only run once the socket is connected and the visitor id
//! is known. Both conditions are published through a `watch` channel, so
//! waiters wake exactly when they become true together. A socket that has
//! given up for good settles the gate without making it ready.

use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Readiness {
    pub socket_connected: bool,
    pub visitor_ready: bool,
    pub socket_failed: bool,
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        self.socket_connected && self.visitor_ready
    }

    /// Nothing left to wait for: either ready, or the socket will never connect.
    pub fn is_settled(&self) -> bool {
        self.is_ready() || self.socket_failed
    }
}

pub struct ReadyGate {
    tx: watch::Sender<Readiness>,
}

impl Default for ReadyGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadyGate {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Readiness::default());
        Self { tx }
    }

    pub fn mark_connected(&self) {
        self.tx.send_modify(|r| {
            r.socket_connected = true;
            r.socket_failed = false;
        });
    }

    pub fn mark_disconnected(&self) {
        self.tx.send_modify(|r| r.socket_connected = false);
    }

    /// The transport stopped retrying.
    pub fn mark_socket_failed(&self) {
        self.tx.send_modify(|r| {
            r.socket_connected = false;
            r.socket_failed = true;
        });
    }

    pub fn mark_visitor_ready(&self) {
        self.tx.send_modify(|r| r.visitor_ready = true);
    }

    pub fn current(&self) -> Readiness {
        *self.tx.borrow()
    }

    /// Waits until both conditions hold, for at most `cap`.
    ///
    /// Returns `false` when the cap elapsed first or the socket failed.
    pub async fn wait(&self, cap: Duration) -> bool {
        let mut rx = self.tx.subscribe();
        match tokio::time::timeout(cap, rx.wait_for(Readiness::is_settled)).await {
            Ok(Ok(readiness)) => readiness.is_ready(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_ready_when_both_conditions_hold() {
        let gate = Arc::new(ReadyGate::new());
        gate.mark_visitor_ready();

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.wait(Duration::from_secs(30)).await })
        };
        tokio::task::yield_now().await;
        gate.mark_connected();

        assert!(waiter.await.unwrap());
        assert!(gate.current().is_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_is_capped() {
        let gate = ReadyGate::new();
        gate.mark_connected();

        let started = tokio::time::Instant::now();
        assert!(!gate.wait(Duration::from_secs(30)).await);
        assert!(started.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_already_ready_returns_immediately() {
        let gate = ReadyGate::new();
        gate.mark_connected();
        gate.mark_visitor_ready();
        assert!(gate.wait(Duration::from_millis(1)).await);

        gate.mark_disconnected();
        assert!(!gate.current().is_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn test_socket_failure_releases_waiters() {
        let gate = Arc::new(ReadyGate::new());
        gate.mark_visitor_ready();

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move {
                let started = tokio::time::Instant::now();
                (gate.wait(Duration::from_secs(30)).await, started.elapsed())
            })
        };
        tokio::task::yield_now().await;
        gate.mark_socket_failed();

        let (ready, waited) = waiter.await.unwrap();
        assert!(!ready);
        assert!(waited < Duration::from_secs(1));
        assert!(gate.current().is_settled());
    }
}
