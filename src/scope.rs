//! The capability handed to notification handlers

use crate::hierarchy::Hierarchy;
use crate::node::StateId;
use crate::property::{PropertyStore, Scalar};
use std::collections::VecDeque;

/// Everything the host owns inside a chart: its context, the properties and the
/// queue of events waiting to be resolved.
#[derive(Debug)]
pub(crate) struct HostState<C> {
    pub(crate) context: C,
    pub(crate) properties: PropertyStore,
    pub(crate) queue: VecDeque<String>,
    pub(crate) properties_changed: bool,
}

impl<C> HostState<C> {
    pub(crate) fn new(context: C, properties: PropertyStore) -> Self {
        Self {
            context,
            properties,
            queue: VecDeque::new(),
            properties_changed: false,
        }
    }

    pub(crate) fn enqueue(&mut self, event: String) {
        log::trace!("Queued event {event:?} ({} waiting)", self.queue.len() + 1);
        self.queue.push_back(event);
    }

    pub(crate) fn set_property(&mut self, name: String, value: Scalar) {
        log::trace!("Property {name} = {value}");
        self.properties.set(name, value);
        self.properties_changed = true;
    }
}

/// Access granted to a handler while the chart is busy.
///
/// A handler can read the configuration, change properties and queue events, but
/// it cannot drive the chart directly. Events sent from here are resolved after
/// the current one has finished, and property changes are swept once the current
/// operation completes.
pub struct Scope<'a, C> {
    host: &'a mut HostState<C>,
    hierarchy: &'a Hierarchy,
}

impl<'a, C> Scope<'a, C> {
    pub(crate) fn new(host: &'a mut HostState<C>, hierarchy: &'a Hierarchy) -> Self {
        Self { host, hierarchy }
    }

    /// The host context
    pub fn context(&self) -> &C {
        &self.host.context
    }

    /// The host context, mutably
    pub fn context_mut(&mut self) -> &mut C {
        &mut self.host.context
    }

    /// Queue an event
    pub fn send_event(&mut self, event: impl Into<String>) {
        self.host.enqueue(event.into());
    }

    /// Set a property
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<Scalar>) {
        self.host.set_property(name.into(), value.into());
    }

    /// Read a property, falling back to `default`
    pub fn property(&self, name: &str, default: impl Into<Scalar>) -> Scalar {
        self.host.properties.get_or(name, default)
    }

    /// All properties
    pub fn properties(&self) -> &PropertyStore {
        &self.host.properties
    }

    /// Whether the state is active
    pub fn is_active(&self, state: StateId) -> bool {
        self.hierarchy.is_active(state)
    }

    /// Whether the named state exists and is active
    pub fn is_state_active(&self, name: &str) -> bool {
        self.state_id(name)
            .is_some_and(|id| self.hierarchy.is_active(id))
    }

    /// Look a state up by name
    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.hierarchy.state_id(name)
    }

    /// Name of a state
    ///
    /// # Panics
    ///
    /// If `state` was not handed out by this chart.
    pub fn state_name(&self, state: StateId) -> &str {
        self.hierarchy.node(state).name()
    }
}
