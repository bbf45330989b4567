//! Agent-response watchdog.
//!
//! A single-shot timer armed whenever the visitor writes to a human agent.
//! Arming replaces the pending timer, so at most one expiry is ever pending.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

struct PendingTimer {
    id: u64,
    handle: JoinHandle<()>,
}

type Slot = Arc<Mutex<Option<PendingTimer>>>;

fn lock(slot: &Slot) -> MutexGuard<'_, Option<PendingTimer>> {
    // the slot holds no invariant a panicking holder could break
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
pub struct AgentResponseWatchdog {
    pending: Slot,
    next_id: AtomicU64,
}

impl AgentResponseWatchdog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the timer, cancelling any pending one first.
    ///
    /// The timer leaves the slot before `on_expiry` runs, so a later
    /// `cancel` never interrupts an expiry already in progress.
    pub fn arm<F, Fut>(&self, after: Duration, on_expiry: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let slot = self.pending.clone();

        let mut pending = lock(&self.pending);
        if let Some(previous) = pending.take() {
            previous.handle.abort();
        }
        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let fired = {
                let mut pending = lock(&slot);
                if pending.as_ref().is_some_and(|p| p.id == id) {
                    pending.take();
                    true
                } else {
                    false
                }
            };
            if fired {
                on_expiry().await;
            }
        });
        *pending = Some(PendingTimer { id, handle });
        tracing::debug!("[Watchdog] Armed for {:?}", after);
    }

    /// Cancels the pending timer. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        match lock(&self.pending).take() {
            Some(timer) => {
                let was_pending = !timer.handle.is_finished();
                timer.handle.abort();
                if was_pending {
                    tracing::debug!("[Watchdog] Cleared");
                }
                was_pending
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        lock(&self.pending)
            .as_ref()
            .is_some_and(|p| !p.handle.is_finished())
    }
}

impl Drop for AgentResponseWatchdog {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter_callback(
        fired: &Arc<AtomicUsize>,
    ) -> impl FnOnce() -> std::future::Ready<()> + Send + 'static {
        let fired = fired.clone();
        move || {
            fired.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_after_duration() {
        let fired = Arc::new(AtomicUsize::new(0));
        let watchdog = AgentResponseWatchdog::new();

        watchdog.arm(Duration::from_secs(120), counter_callback(&fired));
        assert!(watchdog.is_armed());

        tokio::time::sleep(Duration::from_secs(119)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!watchdog.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearming_keeps_a_single_timer() {
        let fired = Arc::new(AtomicUsize::new(0));
        let watchdog = AgentResponseWatchdog::new();

        watchdog.arm(Duration::from_secs(120), counter_callback(&fired));
        tokio::time::sleep(Duration::from_secs(60)).await;
        watchdog.arm(Duration::from_secs(120), counter_callback(&fired));

        // the first timer would have fired at t=120
        tokio::time::sleep(Duration::from_secs(90)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(40)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel() {
        let fired = Arc::new(AtomicUsize::new(0));
        let watchdog = AgentResponseWatchdog::new();

        assert!(!watchdog.cancel());
        watchdog.arm(Duration::from_secs(120), counter_callback(&fired));
        assert!(watchdog.cancel());
        assert!(!watchdog.is_armed());

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_does_not_interrupt_running_expiry() {
        let finished = Arc::new(AtomicUsize::new(0));
        let watchdog = AgentResponseWatchdog::new();

        let done = finished.clone();
        watchdog.arm(Duration::from_secs(120), move || async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            done.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(121)).await;
        assert!(!watchdog.is_armed());
        assert!(!watchdog.cancel());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }
}
