//! Cross-component "open the guide" trigger
//!
//! Other parts of the host raise the signal; the controller subscribes when
//! its loop starts and the subscription goes away when the loop ends.

use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct OpenSignal {
    tx: broadcast::Sender<()>,
}

impl OpenSignal {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(4);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Raise the signal; returns false when no guide is listening
    pub fn notify(&self) -> bool {
        match self.tx.send(()) {
            Ok(listeners) => {
                debug!(listeners, "open signal raised");
                true
            }
            Err(_) => {
                debug!("open signal raised with no listener");
                false
            }
        }
    }
}

impl Default for OpenSignal {
    fn default() -> Self {
        Self::new()
    }
}
