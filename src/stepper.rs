//! Tick-driven notifications and the delayed-transition countdowns

use crate::chart::StateChart;
use crate::observer::Notification;
use crate::Duration;

impl<C, I> StateChart<C, I>
where
    C: Send + 'static,
    I: 'static,
{
    /// Frame tick. Active states get `Processing(delta)`, then delayed
    /// transitions count down by `delta` seconds and the due ones fire.
    pub fn process(&mut self, delta: f64) {
        if !self.is_initialized() {
            return;
        }
        self.broadcast(&Notification::Processing(delta));
        self.advance_timers(delta);
        self.drain();
    }

    /// [`StateChart::process`] with a [`Duration`]
    pub fn process_duration(&mut self, delta: Duration) {
        self.process(delta.as_secs_f64());
    }

    /// Physics tick. Only notifies; countdowns advance in [`StateChart::process`].
    pub fn physics_process(&mut self, delta: f64) {
        if !self.is_initialized() {
            return;
        }
        self.broadcast(&Notification::PhysicsProcessing(delta));
        self.drain();
    }

    /// Deliver host input to every active state
    pub fn input(&mut self, input: &I) {
        if !self.is_initialized() {
            return;
        }
        self.broadcast(&Notification::Input(input));
        self.drain();
    }

    /// Deliver host input nothing else consumed to every active state
    pub fn unhandled_input(&mut self, input: &I) {
        if !self.is_initialized() {
            return;
        }
        self.broadcast(&Notification::UnhandledInput(input));
        self.drain();
    }

    /// Manual step for turn-based hosts. A plain broadcast without event semantics.
    pub fn step(&mut self) {
        if !self.is_initialized() {
            return;
        }
        log::trace!("Step");
        self.broadcast(&Notification::Stepped);
        self.drain();
    }

    /// Notify every active state, parent before child. Handlers cannot change the
    /// configuration, so the snapshot stays accurate for the whole broadcast.
    fn broadcast(&mut self, notification: &Notification<'_, I>) {
        let active = self.hierarchy.active_states();
        log::trace!("Broadcasting {:?} to {} states", notification.kind(), active.len());
        for state in active {
            self.notify(state, notification);
        }
    }

    fn advance_timers(&mut self, delta: f64) {
        self.reevaluate_pending();
        if self.timers.is_empty() {
            return;
        }
        self.timers.advance(delta);

        let pending: Vec<_> = self
            .timers
            .iter()
            .map(|p| (p.source, p.initial, p.remaining.max(0.0)))
            .collect();
        for (source, initial, remaining) in pending {
            self.notify(source, &Notification::TransitionPending { initial, remaining });
        }

        let mut exited = Vec::new();
        let mut fired = false;
        for due in self.timers.take_due() {
            if exited.contains(&due.source) || !self.is_active(due.source) {
                continue;
            }
            log::debug!(
                "Delay of transition {:?} elapsed",
                self.hierarchy.transition(due.transition).name()
            );
            exited.extend(self.take(due.transition));
            fired = true;
        }
        if fired {
            self.settle();
        }
    }
}
