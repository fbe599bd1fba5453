//! Cancellation handle for state-publishing operations.

use std::sync::Arc;

use parking_lot::Mutex;

/// Handle returned by operations that publish into a binding.
///
/// Cancelling guarantees that no further write from that operation happens
/// once `cancel` returns. Work already in flight is not aborted. Dropping the
/// handle does not cancel.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    cancelled: Arc<Mutex<bool>>,
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelHandle {
    /// Creates an active handle.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(Mutex::new(false)),
        }
    }

    /// Creates a handle for an operation that does no work.
    #[must_use]
    pub fn cancelled() -> Self {
        Self {
            cancelled: Arc::new(Mutex::new(true)),
        }
    }

    /// Suppresses any pending write of the operation.
    pub fn cancel(&self) {
        *self.cancelled.lock() = true;
    }

    /// Returns true once cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.lock()
    }

    /// Runs `write` unless the handle is cancelled. Returns whether it ran.
    ///
    /// The lock is held while `write` runs so a concurrent `cancel` either
    /// happens before the write or waits for it.
    pub(crate) fn run_unless_cancelled(&self, write: impl FnOnce()) -> bool {
        let cancelled = self.cancelled.lock();
        if *cancelled {
            return false;
        }
        write();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_handle_skips_writes() {
        let handle = CancelHandle::cancelled();
        let mut ran = false;
        assert!(!handle.run_unless_cancelled(|| ran = true));
        assert!(!ran);
    }

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let handle = CancelHandle::new();
        let task_side = handle.clone();
        assert!(task_side.run_unless_cancelled(|| {}));

        handle.cancel();

        assert!(task_side.is_cancelled());
        assert!(!task_side.run_unless_cancelled(|| {}));
    }
}
