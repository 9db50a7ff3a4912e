//! Notification coalescing
//!
//! Several option mutations can happen inside one user action (a click that
//! selects one option and force-deselects another). Consumers should still
//! see exactly one `input`/`change` pair, so requests are absorbed into a
//! single pending flush.
//!
//! Hosts with their own event loop call [`Debouncer::take`] at the end of a
//! task. Async hosts await [`Debouncer::requested`], sleep the coalescing
//! delay, then take.

use std::cell::Cell;
use std::time::Duration;

use tokio::sync::Notify;

/// Default coalescing window
pub const DEFAULT_NOTIFY_DELAY: Duration = Duration::from_millis(1);

/// Coalesces repeated requests into one pending flush
#[derive(Debug, Default)]
pub struct Debouncer {
    pending: Cell<bool>,
    generation: Cell<u64>,
    wake: Notify,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a flush; returns false when one was already pending
    pub fn request(&self) -> bool {
        self.generation.set(self.generation.get() + 1);
        if self.pending.replace(true) {
            return false;
        }
        self.wake.notify_one();
        true
    }

    pub fn is_pending(&self) -> bool {
        self.pending.get()
    }

    /// Number of requests ever made, absorbed or not
    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    /// Clear the pending flag; true when a flush is due
    pub fn take(&self) -> bool {
        self.pending.replace(false)
    }

    /// Resolve once a request has been made since the last `take`
    pub async fn requested(&self) {
        while !self.pending.get() {
            self.wake.notified().await;
        }
    }
}
