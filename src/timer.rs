//! Countdowns of delayed transitions

use crate::node::StateId;
use crate::transition::TransitionId;

/// Relative slack when testing a countdown for zero. Deltas like `0.1` or
/// `1.0 / 60.0` are inexact, so their sum can stop a hair above the delay.
const DUE_TOLERANCE: f64 = 1e-9;

/// A delayed transition waiting for its countdown to run out.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTransition {
    /// The waiting transition
    pub transition: TransitionId,
    /// Its source state
    pub source: StateId,
    /// Seconds the countdown started with
    pub initial: f64,
    /// Seconds left; may drop below zero on the tick it becomes due
    pub remaining: f64,
    pub(crate) paused: bool,
}

impl PendingTransition {
    /// Whether the countdown is held because its guard currently fails
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    fn is_due(&self) -> bool {
        !self.paused && self.remaining <= DUE_TOLERANCE * self.initial.max(1.0)
    }
}

/// Every running countdown, in the order they were started.
#[derive(Debug, Default)]
pub(crate) struct TimerSet {
    pending: Vec<PendingTransition>,
}

impl TimerSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Start a countdown. A running countdown of the same transition is dropped,
    /// so the restarted one moves to the back of the firing order.
    pub(crate) fn start(&mut self, transition: TransitionId, source: StateId, seconds: f64) {
        self.cancel(transition);
        self.pending.push(PendingTransition {
            transition,
            source,
            initial: seconds,
            remaining: seconds,
            paused: false,
        });
    }

    pub(crate) fn contains(&self, transition: TransitionId) -> bool {
        self.pending.iter().any(|p| p.transition == transition)
    }

    pub(crate) fn get(&self, transition: TransitionId) -> Option<&PendingTransition> {
        self.pending.iter().find(|p| p.transition == transition)
    }

    pub(crate) fn cancel(&mut self, transition: TransitionId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.transition != transition);
        before != self.pending.len()
    }

    /// Drop every countdown owned by one of `sources`; returns the dropped transitions.
    pub(crate) fn cancel_for_sources(&mut self, sources: &[StateId]) -> Vec<TransitionId> {
        let mut cancelled = Vec::new();
        self.pending.retain(|p| {
            if sources.contains(&p.source) {
                cancelled.push(p.transition);
                false
            } else {
                true
            }
        });
        cancelled
    }

    pub(crate) fn set_paused(&mut self, transition: TransitionId, paused: bool) {
        if let Some(p) = self.pending.iter_mut().find(|p| p.transition == transition) {
            p.paused = paused;
        }
    }

    /// Count every running countdown down by `delta` seconds.
    pub(crate) fn advance(&mut self, delta: f64) {
        for p in self.pending.iter_mut().filter(|p| !p.paused) {
            p.remaining -= delta;
        }
    }

    /// Remove and return the countdowns that ran out, oldest first.
    pub(crate) fn take_due(&mut self) -> Vec<PendingTransition> {
        let (due, waiting) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(PendingTransition::is_due);
        self.pending = waiting;
        due
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &PendingTransition> {
        self.pending.iter()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_becomes_due_exactly_at_zero() {
        let mut timers = TimerSet::new();
        timers.start(TransitionId(0), StateId(1), 1.0);

        timers.advance(0.5);
        assert!(timers.take_due().is_empty());
        timers.advance(0.5);

        let due = timers.take_due();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].initial, 1.0);
        assert!(timers.is_empty());
    }

    #[test]
    fn inexact_deltas_add_up_to_the_delay() {
        let mut timers = TimerSet::new();
        timers.start(TransitionId(0), StateId(1), 1.0);
        for _ in 0..9 {
            timers.advance(0.1);
        }
        assert!(timers.take_due().is_empty());
        timers.advance(0.1);
        assert_eq!(timers.take_due().len(), 1);

        timers.start(TransitionId(1), StateId(1), 1.0);
        for _ in 0..59 {
            timers.advance(1.0 / 60.0);
        }
        assert!(timers.take_due().is_empty());
        timers.advance(1.0 / 60.0);
        assert_eq!(timers.take_due().len(), 1);
    }

    #[test]
    fn due_countdowns_keep_start_order() {
        let mut timers = TimerSet::new();
        timers.start(TransitionId(3), StateId(1), 0.2);
        timers.start(TransitionId(1), StateId(2), 0.1);
        timers.start(TransitionId(2), StateId(2), 5.0);

        timers.advance(1.0);
        let due: Vec<_> = timers.take_due().into_iter().map(|p| p.transition).collect();
        assert_eq!(due, vec![TransitionId(3), TransitionId(1)]);
        assert!(timers.contains(TransitionId(2)));
    }

    #[test]
    fn restart_moves_to_the_back() {
        let mut timers = TimerSet::new();
        timers.start(TransitionId(0), StateId(1), 1.0);
        timers.start(TransitionId(1), StateId(1), 1.0);
        timers.advance(0.5);
        timers.start(TransitionId(0), StateId(1), 1.0);

        let order: Vec<_> = timers.iter().map(|p| p.transition).collect();
        assert_eq!(order, vec![TransitionId(1), TransitionId(0)]);
        assert_eq!(timers.get(TransitionId(0)).map(|p| p.remaining), Some(1.0));
    }

    #[test]
    fn paused_countdowns_hold() {
        let mut timers = TimerSet::new();
        timers.start(TransitionId(0), StateId(1), 1.0);
        timers.set_paused(TransitionId(0), true);
        timers.advance(5.0);
        assert!(timers.take_due().is_empty());

        timers.set_paused(TransitionId(0), false);
        timers.advance(1.0);
        assert_eq!(timers.take_due().len(), 1);
    }

    #[test]
    fn cancel_by_source() {
        let mut timers = TimerSet::new();
        timers.start(TransitionId(0), StateId(1), 1.0);
        timers.start(TransitionId(1), StateId(2), 1.0);
        timers.start(TransitionId(2), StateId(1), 1.0);

        let cancelled = timers.cancel_for_sources(&[StateId(1)]);
        assert_eq!(cancelled, vec![TransitionId(0), TransitionId(2)]);
        assert!(timers.contains(TransitionId(1)));
        assert!(!timers.cancel(TransitionId(0)));
    }
}
