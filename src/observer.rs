//! Subscription registry for chart notifications
//!
//! Handlers are kept per state, per transition and per chart. Each list keeps
//! registration order and handlers run synchronously in that order.

use crate::hierarchy::Hierarchy;
use crate::node::StateId;
use crate::scope::{HostState, Scope};
use crate::transition::{Transition, TransitionId};
use std::collections::HashMap;

/// Something that happened to a state.
#[derive(Debug, PartialEq)]
pub enum Notification<'a, I> {
    /// The state became active
    Entered,
    /// The state became inactive
    Exited,
    /// An event is about to be resolved while the state is active
    EventReceived(&'a str),
    /// Frame tick with the elapsed seconds
    Processing(f64),
    /// Physics tick with the elapsed seconds
    PhysicsProcessing(f64),
    /// Manual step
    Stepped,
    /// Host input
    Input(&'a I),
    /// Host input nobody else consumed
    UnhandledInput(&'a I),
    /// A delayed transition owned by the state is counting down
    TransitionPending {
        /// Seconds the countdown started with
        initial: f64,
        /// Seconds left, never below zero
        remaining: f64,
    },
    /// A child of this compound state became active
    ChildEntered(StateId),
    /// A child of this compound state became inactive
    ChildExited(StateId),
}

impl<I> Notification<'_, I> {
    /// The kind used to pick subscribers
    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::Entered => NotificationKind::Entered,
            Notification::Exited => NotificationKind::Exited,
            Notification::EventReceived(_) => NotificationKind::EventReceived,
            Notification::Processing(_) => NotificationKind::Processing,
            Notification::PhysicsProcessing(_) => NotificationKind::PhysicsProcessing,
            Notification::Stepped => NotificationKind::Stepped,
            Notification::Input(_) => NotificationKind::Input,
            Notification::UnhandledInput(_) => NotificationKind::UnhandledInput,
            Notification::TransitionPending { .. } => NotificationKind::TransitionPending,
            Notification::ChildEntered(_) => NotificationKind::ChildEntered,
            Notification::ChildExited(_) => NotificationKind::ChildExited,
        }
    }
}

/// Payload-free tag of a [`Notification`], used when subscribing.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Entered,
    Exited,
    EventReceived,
    Processing,
    PhysicsProcessing,
    Stepped,
    Input,
    UnhandledInput,
    TransitionPending,
    ChildEntered,
    ChildExited,
}

/// Handler subscribed to one notification kind of one state
pub type StateHandler<C, I> = Box<dyn FnMut(&mut Scope<'_, C>, &Notification<'_, I>) + Send>;

/// Handler called when a transition is taken
pub type TransitionHandler<C> = Box<dyn FnMut(&mut Scope<'_, C>, &Transition) + Send>;

/// Handler called once for every resolved event
pub type EventHandler<C> = Box<dyn FnMut(&mut Scope<'_, C>, &str) + Send>;

pub(crate) struct Observers<C, I> {
    states: Vec<HashMap<NotificationKind, Vec<StateHandler<C, I>>>>,
    transitions: Vec<Vec<TransitionHandler<C>>>,
    events: Vec<EventHandler<C>>,
}

impl<C, I> Observers<C, I> {
    pub(crate) fn new(states: usize, transitions: usize) -> Self {
        Self {
            states: (0..states).map(|_| HashMap::new()).collect(),
            transitions: (0..transitions).map(|_| Vec::new()).collect(),
            events: Vec::new(),
        }
    }

    pub(crate) fn add_state(
        &mut self,
        state: StateId,
        kind: NotificationKind,
        handler: StateHandler<C, I>,
    ) {
        self.states[state.0].entry(kind).or_default().push(handler);
    }

    pub(crate) fn add_transition(&mut self, transition: TransitionId, handler: TransitionHandler<C>) {
        self.transitions[transition.0].push(handler);
    }

    pub(crate) fn add_event(&mut self, handler: EventHandler<C>) {
        self.events.push(handler);
    }

    pub(crate) fn notify_state(
        &mut self,
        state: StateId,
        notification: &Notification<'_, I>,
        host: &mut HostState<C>,
        hierarchy: &Hierarchy,
    ) {
        let Some(handlers) = self.states[state.0].get_mut(&notification.kind()) else {
            return;
        };
        let mut scope = Scope::new(host, hierarchy);
        for handler in handlers.iter_mut() {
            handler(&mut scope, notification);
        }
    }

    pub(crate) fn notify_transition(
        &mut self,
        transition: TransitionId,
        host: &mut HostState<C>,
        hierarchy: &Hierarchy,
    ) {
        let handlers = &mut self.transitions[transition.0];
        if handlers.is_empty() {
            return;
        }
        let taken = hierarchy.transition(transition);
        let mut scope = Scope::new(host, hierarchy);
        for handler in handlers.iter_mut() {
            handler(&mut scope, taken);
        }
    }

    pub(crate) fn notify_event(&mut self, event: &str, host: &mut HostState<C>, hierarchy: &Hierarchy) {
        let mut scope = Scope::new(host, hierarchy);
        for handler in self.events.iter_mut() {
            handler(&mut scope, event);
        }
    }
}
