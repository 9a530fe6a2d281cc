//! Cancellable one-shot timer used to detect end of speech
//!
//! Arming the timer spawns a sleeping task that posts a message back to the
//! owner's channel. Re-arming or cancelling aborts the pending task and bumps
//! the generation, so a message that was already in flight is recognisable
//! as stale.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

/// Single pending deadline that reports expiry as a channel message
pub struct DebounceTimer<T> {
    tx: mpsc::Sender<T>,
    fired: fn(u64) -> T,
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> DebounceTimer<T> {
    /// Create a timer that sends `fired(generation)` on expiry
    pub fn new(tx: mpsc::Sender<T>, fired: fn(u64) -> T) -> Self {
        Self {
            tx,
            fired,
            generation: 0,
            pending: None,
        }
    }

    /// Start (or restart) the deadline, cancelling any pending one
    pub fn arm(&mut self, delay: Duration) -> u64 {
        self.cancel();

        let generation = self.generation;
        let tx = self.tx.clone();
        let message = (self.fired)(generation);

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            trace!(generation, "debounce expired");
            let _ = tx.send(message).await;
        }));

        generation
    }

    /// Drop the pending deadline, if any
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        self.generation += 1;
    }

    /// Accept an expiry only if it belongs to the current deadline
    ///
    /// Consumes the deadline, so the same generation is never accepted twice.
    pub fn accept(&mut self, generation: u64) -> bool {
        if self.pending.is_none() || generation != self.generation {
            return false;
        }
        self.pending = None;
        self.generation += 1;
        true
    }
}

impl<T> Drop for DebounceTimer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
