//! Host memory-pressure signal.

use tokio::sync::broadcast;
use tracing::debug;

const CHANNEL_CAPACITY: usize = 16;

/// Broadcast signal raised by the host when memory runs low.
///
/// Carries no payload. Each emission reaches every subscriber once.
#[derive(Debug, Clone)]
pub struct MemoryPressure {
    tx: broadcast::Sender<()>,
}

impl Default for MemoryPressure {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPressure {
    /// Creates a signal with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Raises the signal. Returns how many subscribers were reached.
    pub fn notify(&self) -> usize {
        let reached = self.tx.send(()).unwrap_or(0);
        debug!(subscribers = reached, "Memory pressure signalled");
        reached
    }

    /// Subscribes to future emissions.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }
}
