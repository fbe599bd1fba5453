//! Readiness gate deferring work until a resource finishes opening.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::domain::errors::StoreError;

enum GateState<J> {
    Initializing(VecDeque<J>),
    Ready,
    Failed(StoreError),
}

/// Outcome of submitting a job to the gate.
pub enum Admission<J> {
    /// The resource is ready; the caller dispatches the job itself.
    Dispatch(J),
    /// The job was queued and will be released when the gate resolves.
    Deferred,
    /// The resource failed to open; the job must fail with the error.
    Rejected(J, StoreError),
}

/// Single-assignment gate: `Initializing -> Ready | Failed`.
///
/// Jobs admitted while initializing are kept in admission order and handed
/// back by [`ReadinessGate::resolve`]. Once resolved the state never changes.
pub struct ReadinessGate<J> {
    state: Mutex<GateState<J>>,
}

impl<J> Default for ReadinessGate<J> {
    fn default() -> Self {
        Self::new()
    }
}

impl<J> ReadinessGate<J> {
    /// Creates a gate in the initializing state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GateState::Initializing(VecDeque::new())),
        }
    }

    /// Submits a job.
    pub fn admit(&self, job: J) -> Admission<J> {
        let mut state = self.state.lock();
        match &mut *state {
            GateState::Initializing(deferred) => {
                deferred.push_back(job);
                Admission::Deferred
            }
            GateState::Ready => Admission::Dispatch(job),
            GateState::Failed(error) => Admission::Rejected(job, error.clone()),
        }
    }

    /// Resolves the gate and returns the deferred jobs in admission order.
    ///
    /// Only the first call has an effect; later calls return no jobs.
    pub fn resolve(&self, outcome: Result<(), StoreError>) -> VecDeque<J> {
        let mut state = self.state.lock();
        if !matches!(*state, GateState::Initializing(_)) {
            return VecDeque::new();
        }
        let next = match outcome {
            Ok(()) => GateState::Ready,
            Err(error) => GateState::Failed(error),
        };
        match std::mem::replace(&mut *state, next) {
            GateState::Initializing(deferred) => deferred,
            GateState::Ready | GateState::Failed(_) => VecDeque::new(),
        }
    }

    /// Returns true once the gate resolved successfully.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(*self.state.lock(), GateState::Ready)
    }

    /// Returns the terminal error, if the gate failed.
    #[must_use]
    pub fn failure(&self) -> Option<StoreError> {
        match &*self.state.lock() {
            GateState::Failed(error) => Some(error.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jobs_are_deferred_in_order_until_ready() {
        let gate = ReadinessGate::new();
        assert!(matches!(gate.admit(1), Admission::Deferred));
        assert!(matches!(gate.admit(2), Admission::Deferred));
        assert!(!gate.is_ready());

        let released = gate.resolve(Ok(()));

        assert_eq!(released, VecDeque::from([1, 2]));
        assert!(gate.is_ready());
        assert!(matches!(gate.admit(3), Admission::Dispatch(3)));
    }

    #[test]
    fn test_failure_is_terminal() {
        let gate = ReadinessGate::new();
        assert!(matches!(gate.admit("queued"), Admission::Deferred));

        let released = gate.resolve(Err(StoreError::open("disk full")));
        assert_eq!(released.len(), 1);

        match gate.admit("late") {
            Admission::Rejected(job, error) => {
                assert_eq!(job, "late");
                assert_eq!(error, StoreError::open("disk full"));
            }
            _ => panic!("expected rejection"),
        }
        assert_eq!(gate.failure(), Some(StoreError::open("disk full")));
    }

    #[test]
    fn test_resolve_is_single_assignment() {
        let gate: ReadinessGate<u8> = ReadinessGate::new();
        gate.resolve(Ok(()));
        let released = gate.resolve(Err(StoreError::open("late failure")));

        assert!(released.is_empty());
        assert!(gate.is_ready());
        assert!(gate.failure().is_none());
    }
}
