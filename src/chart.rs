//! The statechart runtime: active configuration, event queue and dispatcher.
//!
//! A [`StateChart`] owns the static hierarchy built by
//! [`StateChartBuilder`](crate::StateChartBuilder), the host context `C`, the
//! property store and every subscribed handler. All mutation of the active
//! configuration happens inside the chart's own methods; handlers only get a
//! [`Scope`], so the chart can never be re-entered while it is resolving
//! something. Events sent from handlers are queued and resolved one at a time,
//! in the order they were queued, after the current one has finished.
//!
//! # Type Parameters
//! - `C`: Host context shared with every handler. Must implement `Send`.
//! - `I`: Host input type delivered through [`StateChart::input`]. Defaults to `()`.
//!
//! # Ordering
//! - Exits run children before parents, entries parents before children, and
//!   siblings in declaration order.
//! - A taken transition first updates every active flag, then emits exits,
//!   the taken notification and entries, so handlers never observe a partially
//!   entered parallel state.
//! - Tick notifications (`process`, `step`, ...) go to every active state,
//!   parent before child.
//!
//! # Errors
//! Only [`StateChart::init`] and name lookups fail. Guards that cannot be
//! evaluated count as failing and are reported through
//! [`StateChart::diagnostics`].
use crate::config::{ChartConfig, DelayPolicy};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{Error, GuardError, Result};
use crate::expression::ExpressionEvaluator;
use crate::guard::GuardEnv;
use crate::hierarchy::Hierarchy;
use crate::node::{StateId, StateKind, StateNode};
use crate::observer::{Notification, NotificationKind, Observers};
use crate::property::{PropertyStore, Scalar};
use crate::scope::{HostState, Scope};
use crate::timer::{PendingTransition, TimerSet};
use crate::transition::{Delay, Transition, TransitionId};
use rand::rngs::StdRng;
use rand::SeedableRng;

// Taken-transition log - only compiled with plantuml feature in debug builds
#[cfg(all(feature = "plantuml", debug_assertions))]
use std::collections::HashMap;
#[cfg(all(feature = "plantuml", debug_assertions))]
use std::time::SystemTime;

/// Taken-transition log entry, one per transition
#[cfg(all(feature = "plantuml", debug_assertions))]
#[derive(Debug, Clone)]
pub struct TransitionRecord {
    /// Name of the transition
    pub name: String,
    /// How often it was taken
    pub count: usize,
    /// When it was taken last
    pub last_taken: SystemTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    ProcessingEvent,
}

/// A hierarchical statechart driven by events, property changes and ticks.
pub struct StateChart<C, I = ()> {
    pub(crate) hierarchy: Hierarchy,
    pub(crate) host: HostState<C>,
    pub(crate) observers: Observers<C, I>,
    evaluator: Box<dyn ExpressionEvaluator>,
    pub(crate) timers: TimerSet,
    config: ChartConfig,
    rng: StdRng,
    diagnostics: DiagnosticSink,
    phase: Phase,
    initialized: bool,

    #[cfg(all(feature = "plantuml", debug_assertions))]
    transition_log: HashMap<TransitionId, TransitionRecord>,
}

impl<C, I> StateChart<C, I>
where
    C: Send + 'static,
    I: 'static,
{
    pub(crate) fn new(
        hierarchy: Hierarchy,
        context: C,
        properties: PropertyStore,
        evaluator: Box<dyn ExpressionEvaluator>,
        config: ChartConfig,
    ) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let observers = Observers::new(hierarchy.nodes().len(), hierarchy.transitions().len());
        let diagnostics = DiagnosticSink::new(config.diagnostic_capacity);
        Self {
            hierarchy,
            host: HostState::new(context, properties),
            observers,
            evaluator,
            timers: TimerSet::new(),
            config,
            rng,
            diagnostics,
            phase: Phase::Idle,
            initialized: false,

            #[cfg(all(feature = "plantuml", debug_assertions))]
            transition_log: HashMap::new(),
        }
    }

    /// Enter the root and cascade down to the leaves, then settle.
    ///
    /// Handlers subscribed before this call see the initial entries.
    pub fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Err(Error::AlreadyInitialized);
        }
        self.initialized = true;

        let root = self.hierarchy.root();
        let entering = self.hierarchy.entry_set(root, &[]);
        for &id in &entering {
            self.hierarchy.set_active(id, true);
        }
        log::info!(
            "Statechart initialized in {}",
            self.describe(&self.hierarchy.active_leaves())
        );
        self.emit_entries(&entering);
        self.start_delays(&entering);

        self.settle();
        self.drain();
        Ok(())
    }

    /// Whether [`StateChart::init`] ran
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Send an event. Events never fail: one that matches no enabled transition
    /// is consumed without effect.
    pub fn send_event(&mut self, event: impl Into<String>) {
        let event = event.into();
        if !self.initialized {
            self.diagnostics.report(Diagnostic::EventBeforeInit { event });
            return;
        }
        self.host.enqueue(event);
        self.drain();
    }

    /// Set a property. Automatic transitions are re-evaluated right away.
    ///
    /// Before [`StateChart::init`] the value is only stored.
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<Scalar>) {
        self.host.set_property(name.into(), value.into());
        if self.initialized {
            self.drain();
        }
    }

    /// Read a property, falling back to `default`
    pub fn get_property(&self, name: &str, default: impl Into<Scalar>) -> Scalar {
        self.host.properties.get_or(name, default)
    }

    /// Read a property if it was set
    pub fn property(&self, name: &str) -> Option<&Scalar> {
        self.host.properties.get(name)
    }

    /// All properties
    pub fn properties(&self) -> &PropertyStore {
        &self.host.properties
    }

    /// Get a reference to the context
    pub fn context(&self) -> &C {
        &self.host.context
    }

    /// Get a mutable reference to the context
    pub fn context_mut(&mut self) -> &mut C {
        &mut self.host.context
    }

    /// Receiver of non-fatal problems such as failing guards. Every call hands out
    /// a clone of the same receiver. Unread diagnostics beyond
    /// [`ChartConfig::diagnostic_capacity`] are dropped.
    pub fn diagnostics(&self) -> flume::Receiver<Diagnostic> {
        self.diagnostics.receiver()
    }

    /// Subscribe to one notification kind of a state
    pub fn subscribe<F>(&mut self, state: StateId, kind: NotificationKind, handler: F) -> Result<()>
    where
        F: FnMut(&mut Scope<'_, C>, &Notification<'_, I>) + Send + 'static,
    {
        if self.hierarchy.get_node(state).is_none() {
            return Err(Error::ForeignState(state));
        }
        self.observers.add_state(state, kind, Box::new(handler));
        Ok(())
    }

    /// Subscribe to one notification kind of a state given by name
    pub fn on<F>(&mut self, state: &str, kind: NotificationKind, handler: F) -> Result<()>
    where
        F: FnMut(&mut Scope<'_, C>, &Notification<'_, I>) + Send + 'static,
    {
        let id = self
            .state_id(state)
            .ok_or_else(|| Error::UnknownState(state.to_string()))?;
        self.subscribe(id, kind, handler)
    }

    /// Subscribe to a transition being taken
    pub fn on_transition_taken<F>(&mut self, transition: TransitionId, handler: F) -> Result<()>
    where
        F: FnMut(&mut Scope<'_, C>, &Transition) + Send + 'static,
    {
        if self.hierarchy.get_transition(transition).is_none() {
            return Err(Error::ForeignTransition(transition));
        }
        self.observers.add_transition(transition, Box::new(handler));
        Ok(())
    }

    /// Subscribe to every resolved event, in processing order
    pub fn on_event_received<F>(&mut self, handler: F)
    where
        F: FnMut(&mut Scope<'_, C>, &str) + Send + 'static,
    {
        self.observers.add_event(Box::new(handler));
    }

    /// Look a state up by name
    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.hierarchy.state_id(name)
    }

    /// Node of a state; `None` for an id of another chart
    pub fn state(&self, id: StateId) -> Option<&StateNode> {
        self.hierarchy.get_node(id)
    }

    /// Every state, in declaration order
    pub fn states(&self) -> &[StateNode] {
        self.hierarchy.nodes()
    }

    /// Name of a state
    ///
    /// # Panics
    ///
    /// If `id` was not handed out by this chart.
    pub fn state_name(&self, id: StateId) -> &str {
        self.hierarchy.node(id).name()
    }

    /// The root state
    pub fn root(&self) -> StateId {
        self.hierarchy.root()
    }

    /// Look a transition up by name
    pub fn transition_id(&self, name: &str) -> Option<TransitionId> {
        self.hierarchy.transition_id(name)
    }

    /// A transition; `None` for an id of another chart
    pub fn transition(&self, id: TransitionId) -> Option<&Transition> {
        self.hierarchy.get_transition(id)
    }

    /// Whether a state is active
    pub fn is_active(&self, id: StateId) -> bool {
        self.hierarchy.is_active(id)
    }

    /// Whether the named state exists and is active
    pub fn is_state_active(&self, name: &str) -> bool {
        self.state_id(name).is_some_and(|id| self.is_active(id))
    }

    /// Active states, parents before children
    pub fn active_states(&self) -> Vec<StateId> {
        self.hierarchy.active_states()
    }

    /// Active states without active children
    pub fn active_leaves(&self) -> Vec<StateId> {
        self.hierarchy.active_leaves()
    }

    /// Running countdowns in the order they would fire
    pub fn pending_transitions(&self) -> Vec<PendingTransition> {
        self.timers.iter().cloned().collect()
    }

    /// Resolve queued events and pending property sweeps until nothing is left.
    pub(crate) fn drain(&mut self) {
        if self.phase == Phase::ProcessingEvent {
            return;
        }
        self.phase = Phase::ProcessingEvent;
        loop {
            if self.host.properties_changed {
                self.settle();
                continue;
            }
            let Some(event) = self.host.queue.pop_front() else {
                break;
            };
            self.resolve_event(&event);
        }
        self.phase = Phase::Idle;
    }

    fn resolve_event(&mut self, event: &str) {
        log::trace!("Resolving event {event:?}");
        for id in self.hierarchy.active_states() {
            self.observers.notify_state(
                id,
                &Notification::EventReceived(event),
                &mut self.host,
                &self.hierarchy,
            );
        }

        if self.run_pass(Some(event)) {
            self.settle();
        }

        self.observers
            .notify_event(event, &mut self.host, &self.hierarchy);
    }

    /// Run automatic passes until one takes nothing.
    pub(crate) fn settle(&mut self) {
        let mut iterations = 0;
        loop {
            self.host.properties_changed = false;
            if !self.run_pass(None) {
                break;
            }
            iterations += 1;
            if iterations >= self.config.max_settle_iterations {
                self.diagnostics
                    .report(Diagnostic::SettleLimitReached { iterations });
                break;
            }
        }
        self.host.properties_changed = false;
    }

    /// One resolution pass. Returns whether a transition was taken; scheduling a
    /// delayed one does not count.
    fn run_pass(&mut self, event: Option<&str>) -> bool {
        let selected = {
            let hierarchy = &self.hierarchy;
            let properties = &self.host.properties;
            let evaluator = self.evaluator.as_ref();
            let diagnostics = &self.diagnostics;
            let mut passes =
                |t: &Transition| guard_passes(hierarchy, properties, evaluator, diagnostics, t);
            hierarchy.select_transitions(event, &mut passes)
        };

        let mut exited: Vec<StateId> = Vec::new();
        let mut taken = false;
        for id in selected {
            let transition = self.hierarchy.transition(id);
            let source = transition.source();
            // an earlier transition of this pass left the source
            if exited.contains(&source) || !self.hierarchy.is_active(source) {
                continue;
            }
            match transition.delay() {
                Some(delay) => self.schedule(id, delay, event.is_some()),
                None => {
                    exited.extend(self.take(id));
                    taken = true;
                }
            }
        }
        taken
    }

    /// Start the countdown of a selected delayed transition. A running automatic
    /// countdown keeps going; an event restarts it.
    fn schedule(&mut self, id: TransitionId, delay: Delay, restart: bool) {
        if !restart && self.timers.contains(id) {
            return;
        }
        let seconds = delay.sample(&mut self.rng);
        let transition = self.hierarchy.transition(id);
        log::debug!(
            "Scheduled transition {:?} in {seconds:.3}s",
            transition.name()
        );
        self.timers.start(id, transition.source(), seconds);
    }

    /// Countdowns of automatic delayed transitions start when their source is
    /// entered and the guard passes.
    fn start_delays(&mut self, entered: &[StateId]) {
        for &state in entered {
            let candidates: Vec<(TransitionId, Delay)> = self
                .hierarchy
                .node(state)
                .transitions()
                .iter()
                .map(|&t| self.hierarchy.transition(t))
                .filter(|t| t.is_automatic())
                .filter_map(|t| t.delay().map(|d| (t.id(), d)))
                .collect();
            for (id, delay) in candidates {
                if self.check_guard(id) {
                    self.schedule(id, delay, false);
                }
            }
        }
    }

    /// Apply a transition. Returns the exited states.
    pub(crate) fn take(&mut self, id: TransitionId) -> Vec<StateId> {
        let domain = self.hierarchy.domain(id);
        let targets = self.hierarchy.transition(id).targets().to_vec();

        let exiting = self.hierarchy.exit_set(domain);
        self.hierarchy.record_history(&exiting);
        for cancelled in self.timers.cancel_for_sources(&exiting) {
            log::debug!(
                "Cancelled pending transition {:?}",
                self.hierarchy.transition(cancelled).name()
            );
        }
        for &state in &exiting {
            self.hierarchy.set_active(state, false);
        }
        let entering = self.hierarchy.entry_set(domain, &targets);
        for &state in &entering {
            self.hierarchy.set_active(state, true);
        }

        log::debug!(
            "Transition {:?}: exited {}, entered {}",
            self.hierarchy.transition(id).name(),
            self.describe(&exiting),
            self.describe(&entering)
        );
        #[cfg(all(feature = "plantuml", debug_assertions))]
        self.record_taken(id);

        self.emit_exits(&exiting);
        self.observers
            .notify_transition(id, &mut self.host, &self.hierarchy);
        self.emit_entries(&entering);
        self.start_delays(&entering);
        exiting
    }

    fn emit_exits(&mut self, exited: &[StateId]) {
        for &state in exited {
            self.notify(state, &Notification::Exited);
            if let Some(parent) = self.compound_parent(state) {
                self.notify(parent, &Notification::ChildExited(state));
            }
        }
    }

    fn emit_entries(&mut self, entered: &[StateId]) {
        for &state in entered {
            self.notify(state, &Notification::Entered);
            if let Some(parent) = self.compound_parent(state) {
                self.notify(parent, &Notification::ChildEntered(state));
            }
        }
    }

    fn compound_parent(&self, state: StateId) -> Option<StateId> {
        self.hierarchy
            .node(state)
            .parent()
            .filter(|&p| matches!(self.hierarchy.node(p).kind(), StateKind::Compound { .. }))
    }

    pub(crate) fn notify(&mut self, state: StateId, notification: &Notification<'_, I>) {
        self.observers
            .notify_state(state, notification, &mut self.host, &self.hierarchy);
    }

    pub(crate) fn check_guard(&self, id: TransitionId) -> bool {
        guard_passes(
            &self.hierarchy,
            &self.host.properties,
            self.evaluator.as_ref(),
            &self.diagnostics,
            self.hierarchy.transition(id),
        )
    }

    /// Re-check the guards of running countdowns that asked for it, then restart
    /// missing automatic ones whose guard passes again.
    pub(crate) fn reevaluate_pending(&mut self) {
        let watched: Vec<TransitionId> = self
            .timers
            .iter()
            .map(|p| p.transition)
            .filter(|&t| self.hierarchy.transition(t).reevaluates_on_every_frame())
            .collect();
        for id in watched {
            let passes = self.check_guard(id);
            match (passes, self.config.delay_policy) {
                (true, _) => self.timers.set_paused(id, false),
                (false, DelayPolicy::Pause) => self.timers.set_paused(id, true),
                (false, DelayPolicy::Reset) => {
                    self.timers.cancel(id);
                    log::debug!(
                        "Guard of pending transition {:?} failed, countdown reset",
                        self.hierarchy.transition(id).name()
                    );
                }
            }
        }

        let missing: Vec<(TransitionId, Delay)> = self
            .hierarchy
            .active_states()
            .into_iter()
            .flat_map(|s| self.hierarchy.node(s).transitions().iter().copied())
            .map(|t| self.hierarchy.transition(t))
            .filter(|t| t.is_automatic() && t.reevaluates_on_every_frame())
            .filter(|t| !self.timers.contains(t.id()))
            .filter_map(|t| t.delay().map(|d| (t.id(), d)))
            .collect();
        for (id, delay) in missing {
            if self.check_guard(id) {
                self.schedule(id, delay, false);
            }
        }
    }

    fn describe(&self, states: &[StateId]) -> String {
        let names: Vec<&str> = states
            .iter()
            .map(|&s| self.hierarchy.node(s).name())
            .collect();
        format!("[{}]", names.join(", "))
    }

    /// Count a taken transition so the diagram can draw it bold
    #[cfg(all(feature = "plantuml", debug_assertions))]
    fn record_taken(&mut self, id: TransitionId) {
        let name = self.hierarchy.transition(id).name().to_string();
        let record = self
            .transition_log
            .entry(id)
            .or_insert_with(|| TransitionRecord {
                name,
                count: 0,
                last_taken: SystemTime::now(),
            });
        record.count += 1;
        record.last_taken = SystemTime::now();
    }

    /// Taken transitions recorded for the diagram
    #[cfg(all(feature = "plantuml", debug_assertions))]
    pub fn transition_log(&self) -> &HashMap<TransitionId, TransitionRecord> {
        &self.transition_log
    }

    // Export PlantUML diagram - only available with plantuml feature in debug builds
    /// Render the hierarchy as a PlantUML state diagram. Active states are
    /// highlighted and transitions taken so far are drawn bold.
    #[cfg(all(feature = "plantuml", debug_assertions))]
    pub fn export_plantuml(&self) -> String {
        let taken = self.transition_log.keys().copied().collect();
        crate::plantuml::generate_plantuml(&self.hierarchy, &taken)
    }

    /// Stub for export_plantuml when feature is disabled
    #[cfg(not(all(feature = "plantuml", debug_assertions)))]
    pub fn export_plantuml(&self) -> String {
        String::from("PlantUML export not available (requires 'plantuml' feature and debug build)")
    }
}

fn guard_passes(
    hierarchy: &Hierarchy,
    properties: &PropertyStore,
    evaluator: &dyn ExpressionEvaluator,
    diagnostics: &DiagnosticSink,
    transition: &Transition,
) -> bool {
    let Some(guard) = transition.guard() else {
        return true;
    };
    let is_active = |name: &str| {
        hierarchy
            .state_id(name)
            .map(|id| hierarchy.is_active(id))
            .ok_or_else(|| GuardError::UnknownState(name.to_string()))
    };
    let env = GuardEnv {
        properties,
        evaluator,
        is_active: &is_active,
    };
    match guard.check(&env) {
        Ok(passes) => passes,
        Err(error) => {
            diagnostics.report(Diagnostic::GuardFailed {
                transition: transition.name().to_string(),
                error,
            });
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{StateChartBuilder, StateDef, TransitionDef};
    use crate::guard::Guard;

    #[derive(Debug, Default)]
    struct Log {
        lines: Vec<String>,
    }

    fn record(chart: &mut StateChart<Log>, state: &str) {
        for kind in [NotificationKind::Entered, NotificationKind::Exited] {
            let name = state.to_string();
            chart
                .on(state, kind, move |scope, n| {
                    let verb = match n {
                        Notification::Entered => "enter",
                        _ => "exit",
                    };
                    scope.context_mut().lines.push(format!("{verb} {name}"));
                })
                .unwrap();
        }
    }

    fn names(chart: &StateChart<Log>, ids: &[StateId]) -> Vec<String> {
        ids.iter().map(|&id| chart.state_name(id).to_string()).collect()
    }

    // Root
    // ├── Menu (compound) ── Main, Settings
    // └── Game (parallel) ── Board, Sound (compound: On, Off)
    fn create_test_chart() -> StateChart<Log> {
        let mut chart = StateChartBuilder::new(Log::default())
            .states([
                StateDef::compound("Root").initial("Menu"),
                StateDef::compound("Menu").parent("Root").initial("Main"),
                StateDef::atomic("Main").parent("Menu"),
                StateDef::atomic("Settings").parent("Menu"),
                StateDef::parallel("Game").parent("Root"),
                StateDef::atomic("Board").parent("Game"),
                StateDef::compound("Sound").parent("Game").initial("On"),
                StateDef::atomic("On").parent("Sound"),
                StateDef::atomic("Off").parent("Sound"),
            ])
            .transitions([
                TransitionDef::new("Main").on("select").to("Settings"),
                TransitionDef::new("Menu").on("play").to("Game"),
                TransitionDef::new("Game").on("quit").to("Menu"),
                TransitionDef::new("On").on("mute").to("Off"),
                TransitionDef::new("Off").on("mute").to("On"),
            ])
            .build()
            .unwrap();
        for state in ["Root", "Menu", "Main", "Settings", "Game", "Board", "Sound", "On", "Off"] {
            record(&mut chart, state);
        }
        chart
    }

    #[test]
    fn test_initialization() {
        let mut chart = create_test_chart();
        assert!(!chart.is_initialized());
        assert!(chart.active_states().is_empty());

        chart.init().unwrap();

        assert_eq!(
            names(&chart, &chart.active_states()),
            vec!["Root", "Menu", "Main"]
        );
        assert_eq!(
            chart.context().lines,
            vec!["enter Root", "enter Menu", "enter Main"]
        );
        assert_eq!(chart.init(), Err(Error::AlreadyInitialized));
    }

    #[test]
    fn test_inner_transition_wins() {
        let mut chart = create_test_chart();
        chart.init().unwrap();

        chart.send_event("select");
        assert_eq!(names(&chart, &chart.active_leaves()), vec!["Settings"]);

        // Menu handles "play" for whichever child is active
        chart.send_event("play");
        assert_eq!(names(&chart, &chart.active_leaves()), vec!["Board", "On"]);
        assert!(!chart.is_state_active("Menu"));
    }

    #[test]
    fn test_exit_and_entry_order() {
        let mut chart = create_test_chart();
        chart.init().unwrap();
        chart.context_mut().lines.clear();

        chart.send_event("play");
        assert_eq!(
            chart.context().lines,
            vec![
                "exit Main",
                "exit Menu",
                "enter Game",
                "enter Board",
                "enter Sound",
                "enter On"
            ]
        );

        chart.context_mut().lines.clear();
        chart.send_event("quit");
        assert_eq!(
            chart.context().lines,
            vec![
                "exit Board",
                "exit On",
                "exit Sound",
                "exit Game",
                "enter Menu",
                "enter Main"
            ]
        );
    }

    #[test]
    fn test_parallel_regions_are_entered_before_any_notification() {
        let mut chart = create_test_chart();
        chart.init().unwrap();
        let game = chart.state_id("Game").unwrap();
        chart
            .subscribe(game, NotificationKind::Entered, |scope, _| {
                let all = ["Board", "Sound", "On"]
                    .iter()
                    .all(|name| scope.is_state_active(name));
                scope.context_mut().lines.push(format!("regions active: {all}"));
            })
            .unwrap();

        chart.send_event("play");
        assert!(chart
            .context()
            .lines
            .contains(&"regions active: true".to_string()));
    }

    #[test]
    fn test_unmatched_event_changes_nothing() {
        let mut chart = create_test_chart();
        chart.init().unwrap();
        chart.on_event_received(|scope, event| {
            scope.context_mut().lines.push(format!("event {event}"));
        });
        chart.context_mut().lines.clear();
        let before = chart.active_states();

        chart.send_event("mute");

        assert_eq!(chart.active_states(), before);
        assert_eq!(chart.context().lines, vec!["event mute"]);
    }

    #[test]
    fn test_self_transition_reenters() {
        let mut chart = StateChartBuilder::new(Log::default())
            .states([
                StateDef::compound("Root").initial("Idle"),
                StateDef::atomic("Idle").parent("Root"),
            ])
            .transition(TransitionDef::new("Idle").on("again").to("Idle"))
            .build()
            .unwrap();
        record(&mut chart, "Idle");
        chart.init().unwrap();
        chart.context_mut().lines.clear();

        chart.send_event("again");
        assert_eq!(chart.context().lines, vec!["exit Idle", "enter Idle"]);
    }

    #[test]
    fn test_child_notifications() {
        let mut chart = create_test_chart();
        let menu = chart.state_id("Menu").unwrap();
        for kind in [NotificationKind::ChildEntered, NotificationKind::ChildExited] {
            chart.subscribe(menu, kind, |scope, n| {
                let line = match n {
                    Notification::ChildEntered(child) => format!("+{}", scope.state_name(*child)),
                    Notification::ChildExited(child) => format!("-{}", scope.state_name(*child)),
                    _ => unreachable!(),
                };
                scope.context_mut().lines.push(line);
            })
            .unwrap();
        }
        chart.init().unwrap();
        chart.send_event("select");

        let lines: Vec<&str> = chart
            .context()
            .lines
            .iter()
            .map(String::as_str)
            .filter(|l| l.starts_with('+') || l.starts_with('-'))
            .collect();
        assert_eq!(lines, vec!["+Main", "-Main", "+Settings"]);
    }

    #[test]
    fn test_state_active_guard() {
        let mut chart = StateChartBuilder::new(Log::default())
            .states([
                StateDef::parallel("Root"),
                StateDef::compound("Door").parent("Root").initial("Closed"),
                StateDef::atomic("Closed").parent("Door"),
                StateDef::atomic("Open").parent("Door"),
                StateDef::compound("Lock").parent("Root").initial("Unlocked"),
                StateDef::atomic("Unlocked").parent("Lock"),
                StateDef::atomic("Locked").parent("Lock"),
            ])
            .transitions([
                TransitionDef::new("Closed")
                    .on("open")
                    .to("Open")
                    .guard(Guard::state_active("Unlocked")),
                TransitionDef::new("Unlocked").on("lock").to("Locked"),
            ])
            .build()
            .unwrap();
        chart.init().unwrap();

        chart.send_event("lock");
        chart.send_event("open");
        assert!(chart.is_state_active("Closed"));
    }

    #[test]
    fn test_events_before_init_are_reported() {
        let mut chart = create_test_chart();
        let diagnostics = chart.diagnostics();

        chart.send_event("play");

        assert_eq!(
            diagnostics.try_recv(),
            Ok(Diagnostic::EventBeforeInit {
                event: "play".to_string()
            })
        );
        assert!(chart.context().lines.is_empty());
    }

    #[test]
    fn test_unknown_state_subscription() {
        let mut chart = create_test_chart();
        let result = chart.on("Nowhere", NotificationKind::Entered, |_, _| {});
        assert_eq!(result, Err(Error::UnknownState("Nowhere".to_string())));
    }

    #[test]
    fn test_ids_of_another_chart_are_rejected() {
        let mut chart = create_test_chart();
        let state = StateId(chart.states().len() + 3);
        let transition = TransitionId(chart.hierarchy.transitions().len() + 3);

        assert!(chart.state(state).is_none());
        assert!(chart.transition(transition).is_none());
        assert!(!chart.is_active(state));
        assert_eq!(
            chart.subscribe(state, NotificationKind::Entered, |_, _| {}),
            Err(Error::ForeignState(state))
        );
        assert_eq!(
            chart.on_transition_taken(transition, |_, _| {}),
            Err(Error::ForeignTransition(transition))
        );
    }

    #[cfg(all(feature = "plantuml", debug_assertions))]
    #[test]
    fn test_plantuml_generation() {
        let mut chart = create_test_chart();
        chart.init().unwrap();
        chart.send_event("play");

        let play = chart.transition_id("Menu->Game").unwrap();
        assert_eq!(chart.transition_log()[&play].count, 1);

        let plantuml = chart.export_plantuml();
        assert!(plantuml.contains("@startuml"));
        assert!(plantuml.contains("@enduml"));
        assert!(plantuml.contains("<<Current>>"));
        assert!(plantuml.contains("-[bold]->"));
    }
}
