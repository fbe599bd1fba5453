//! Observable single-value slot.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

struct Slot<T> {
    value: T,
    subscribers: Vec<mpsc::UnboundedSender<T>>,
}

/// Shared mutable cell that notifies subscribers on every write.
///
/// Clones share the same slot. Every `set` is delivered to every live
/// subscriber in write order; writes are never coalesced. Subscribers consume
/// their receiver on whichever task owns rendering.
pub struct Binding<T> {
    slot: Arc<Mutex<Slot<T>>>,
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T: Default> Default for Binding<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.slot.lock();
        f.debug_struct("Binding")
            .field("value", &slot.value)
            .field("subscribers", &slot.subscribers.len())
            .finish()
    }
}

impl<T> Binding<T> {
    /// Creates a binding holding `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot {
                value,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Returns a receiver for every value written after this call.
    #[must_use]
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.slot.lock().subscribers.push(tx);
        rx
    }
}

impl<T: Clone> Binding<T> {
    /// Returns a copy of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.slot.lock().value.clone()
    }

    /// Replaces the value and notifies subscribers.
    /// Subscribers whose receiver was dropped are forgotten.
    pub fn set(&self, value: T) {
        let mut slot = self.slot.lock();
        slot.subscribers.retain(|tx| tx.send(value.clone()).is_ok());
        slot.value = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let binding = Binding::new(1);
        binding.set(2);
        assert_eq!(binding.get(), 2);
    }

    #[test]
    fn test_subscribers_see_every_write_in_order() {
        let binding = Binding::new(0);
        let mut rx = binding.subscribe();

        binding.set(1);
        binding.set(1);
        binding.set(2);

        assert_eq!(rx.try_recv().ok(), Some(1));
        assert_eq!(rx.try_recv().ok(), Some(1));
        assert_eq!(rx.try_recv().ok(), Some(2));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_subscribe_does_not_replay_current_value() {
        let binding = Binding::new(5);
        let mut rx = binding.subscribe();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_clones_share_slot_and_dropped_subscribers_are_pruned() {
        let binding = Binding::new("a".to_string());
        let other = binding.clone();
        let rx = binding.subscribe();
        drop(rx);

        other.set("b".to_string());

        assert_eq!(binding.get(), "b");
        assert_eq!(binding.slot.lock().subscribers.len(), 0);
    }
}
