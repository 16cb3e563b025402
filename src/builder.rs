//! Builder pattern implementation for statecharts

use crate::chart::StateChart;
use crate::config::ChartConfig;
use crate::error::{Error, Result};
use crate::expression::{ComparisonEvaluator, ExpressionEvaluator};
use crate::guard::Guard;
use crate::hierarchy::Hierarchy;
use crate::node::{HistoryMode, StateId, StateKind, StateNode};
use crate::property::{PropertyStore, Scalar};
use crate::transition::{Delay, Transition, TransitionId};
use std::collections::HashMap;
use std::marker::PhantomData;

#[derive(Debug, Clone, Copy, PartialEq)]
enum DefKind {
    Atomic,
    Compound,
    Parallel,
    History(HistoryMode),
}

/// Declaration of one state.
///
/// States refer to each other by name; names must be unique within a chart.
#[derive(Debug, Clone)]
pub struct StateDef {
    name: String,
    parent: Option<String>,
    kind: DefKind,
    initial: Option<String>,
    default: Option<String>,
}

impl StateDef {
    fn new(name: impl Into<String>, kind: DefKind) -> Self {
        Self {
            name: name.into(),
            parent: None,
            kind,
            initial: None,
            default: None,
        }
    }

    /// A leaf state
    pub fn atomic(name: impl Into<String>) -> Self {
        Self::new(name, DefKind::Atomic)
    }

    /// A state with exactly one active child; set the child with [`StateDef::initial`]
    pub fn compound(name: impl Into<String>) -> Self {
        Self::new(name, DefKind::Compound)
    }

    /// A state whose children are all active together
    pub fn parallel(name: impl Into<String>) -> Self {
        Self::new(name, DefKind::Parallel)
    }

    /// A shallow history pseudo state; must be a direct child of a compound state
    pub fn history(name: impl Into<String>) -> Self {
        Self::new(name, DefKind::History(HistoryMode::Shallow))
    }

    /// Attach to a parent state
    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Initial child of a compound state. Ignored by other kinds.
    pub fn initial(mut self, child: impl Into<String>) -> Self {
        self.initial = Some(child.into());
        self
    }

    /// Make a history state deep. Ignored by other kinds.
    pub fn deep(mut self) -> Self {
        if let DefKind::History(_) = self.kind {
            self.kind = DefKind::History(HistoryMode::Deep);
        }
        self
    }

    /// Sibling entered by a history state that has nothing recorded yet.
    /// Ignored by other kinds.
    pub fn default_state(mut self, state: impl Into<String>) -> Self {
        self.default = Some(state.into());
        self
    }

    /// Declared name
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Declaration of one transition.
#[derive(Debug, Clone)]
pub struct TransitionDef {
    name: Option<String>,
    source: String,
    targets: Vec<String>,
    trigger: Option<String>,
    guard: Option<Guard>,
    delay: Option<Delay>,
    reevaluate_on_every_frame: bool,
}

impl TransitionDef {
    /// Start a transition owned by `source`
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            name: None,
            source: source.into(),
            targets: Vec::new(),
            trigger: None,
            guard: None,
            delay: None,
            reevaluate_on_every_frame: false,
        }
    }

    /// Add a target. Several targets may enter several regions of a parallel state at once.
    pub fn to(mut self, target: impl Into<String>) -> Self {
        self.targets.push(target.into());
        self
    }

    /// Event triggering the transition. Without one the transition is automatic.
    pub fn on(mut self, event: impl Into<String>) -> Self {
        self.trigger = Some(event.into());
        self
    }

    /// Guard gating the transition
    pub fn guard(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Shorthand for an expression guard
    pub fn when(self, expression: impl Into<String>) -> Self {
        self.guard(Guard::Expression(expression.into()))
    }

    /// Fire only after `seconds` of tick time. Zero means no delay.
    pub fn delay(mut self, seconds: f64) -> Self {
        self.delay = Some(Delay::Fixed(seconds));
        self
    }

    /// Fire after a delay sampled from `min..=max` each time the countdown starts
    pub fn random_delay(mut self, min: f64, max: f64) -> Self {
        self.delay = Some(Delay::Random { min, max });
        self
    }

    /// Re-check the guard on every tick while the countdown runs
    pub fn reevaluate_on_every_frame(mut self) -> Self {
        self.reevaluate_on_every_frame = true;
        self
    }

    /// Name used for lookups, logs and diagnostics
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Builder for constructing statecharts
pub struct StateChartBuilder<C, I = ()> {
    context: C,
    states: Vec<StateDef>,
    transitions: Vec<TransitionDef>,
    properties: PropertyStore,
    evaluator: Box<dyn ExpressionEvaluator>,
    config: ChartConfig,
    _input: PhantomData<fn(&I)>,
}

impl<C> StateChartBuilder<C>
where
    C: Send + 'static,
{
    /// Create a new builder with the given host context. The chart takes no
    /// host input; see [`StateChartBuilder::with_input`].
    pub fn new(context: C) -> Self {
        Self::with_input(context)
    }
}

impl<C, I> StateChartBuilder<C, I>
where
    C: Send + 'static,
    I: 'static,
{
    /// Create a new builder for a chart receiving host input of type `I`
    /// through [`StateChart::input`]
    pub fn with_input(context: C) -> Self {
        Self {
            context,
            states: Vec::new(),
            transitions: Vec::new(),
            properties: PropertyStore::new(),
            evaluator: Box::new(ComparisonEvaluator),
            config: ChartConfig::default(),
            _input: PhantomData,
        }
    }

    /// Declare a state. Children keep their declaration order.
    pub fn state(mut self, state: StateDef) -> Self {
        self.states.push(state);
        self
    }

    /// Declare several states at once
    pub fn states(mut self, states: impl IntoIterator<Item = StateDef>) -> Self {
        self.states.extend(states);
        self
    }

    /// Declare a transition. Transitions of one state keep their declaration order.
    pub fn transition(mut self, transition: TransitionDef) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Declare several transitions at once
    pub fn transitions(mut self, transitions: impl IntoIterator<Item = TransitionDef>) -> Self {
        self.transitions.extend(transitions);
        self
    }

    /// Set an initial property value
    pub fn property(mut self, name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.properties.set(name, value);
        self
    }

    /// Replace the expression evaluator used by expression guards
    pub fn evaluator<E>(mut self, evaluator: E) -> Self
    where
        E: ExpressionEvaluator + 'static,
    {
        self.evaluator = Box::new(evaluator);
        self
    }

    /// Set runtime options
    pub fn config(mut self, config: ChartConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate the hierarchy and build the chart. The chart still has to be
    /// started with [`StateChart::init`].
    pub fn build(self) -> Result<StateChart<C, I>> {
        let hierarchy = compile(&self.states, &self.transitions)?;
        Ok(StateChart::new(
            hierarchy,
            self.context,
            self.properties,
            self.evaluator,
            self.config,
        ))
    }
}

fn compile(states: &[StateDef], transitions: &[TransitionDef]) -> Result<Hierarchy> {
    if states.is_empty() {
        return Err(Error::EmptyChart);
    }

    let mut ids: HashMap<&str, StateId> = HashMap::new();
    for (i, def) in states.iter().enumerate() {
        if ids.insert(def.name.as_str(), StateId(i)).is_some() {
            return Err(Error::DuplicateState(def.name.clone()));
        }
    }
    let lookup = |name: &str| {
        ids.get(name)
            .copied()
            .ok_or_else(|| Error::UnknownState(name.to_string()))
    };

    let parents = states
        .iter()
        .map(|def| def.parent.as_deref().map(lookup).transpose())
        .collect::<Result<Vec<Option<StateId>>>>()?;

    // a parent chain longer than the number of states must loop
    for (i, def) in states.iter().enumerate() {
        let mut current = parents[i];
        let mut steps = 0;
        while let Some(p) = current {
            steps += 1;
            if steps > states.len() {
                return Err(Error::CyclicHierarchy(def.name.clone()));
            }
            current = parents[p.0];
        }
    }

    let roots: Vec<usize> = (0..states.len()).filter(|&i| parents[i].is_none()).collect();
    let root = match roots.as_slice() {
        [] => return Err(Error::MissingRoot),
        [root] => StateId(*root),
        _ => {
            return Err(Error::MultipleRoots(
                roots.iter().map(|&i| states[i].name.clone()).collect(),
            ))
        }
    };

    let mut children: Vec<Vec<StateId>> = vec![Vec::new(); states.len()];
    for (i, parent) in parents.iter().enumerate() {
        if let Some(p) = parent {
            children[p.0].push(StateId(i));
        }
    }

    let mut nodes = Vec::with_capacity(states.len());
    for (i, def) in states.iter().enumerate() {
        if let Some(p) = parents[i] {
            let parent = &states[p.0];
            match (def.kind, parent.kind) {
                (_, DefKind::Atomic | DefKind::History(_)) => {
                    return Err(Error::InvalidParent {
                        child: def.name.clone(),
                        parent: parent.name.clone(),
                    })
                }
                (DefKind::History(_), DefKind::Parallel) => {
                    return Err(Error::HistoryOutsideCompound(def.name.clone()))
                }
                _ => {}
            }
        }

        let kind = match def.kind {
            DefKind::Atomic => StateKind::Atomic,
            DefKind::Parallel => StateKind::Parallel,
            DefKind::Compound => {
                let name = def
                    .initial
                    .as_deref()
                    .ok_or_else(|| Error::MissingInitialState(def.name.clone()))?;
                let initial = lookup(name)?;
                if parents[initial.0] != Some(StateId(i))
                    || matches!(states[initial.0].kind, DefKind::History(_))
                {
                    return Err(Error::InvalidInitialState {
                        state: def.name.clone(),
                        initial: name.to_string(),
                    });
                }
                StateKind::Compound { initial }
            }
            DefKind::History(mode) => {
                if parents[i].is_none() {
                    return Err(Error::HistoryOutsideCompound(def.name.clone()));
                }
                let default = match def.default.as_deref() {
                    None => None,
                    Some(name) => {
                        let state = lookup(name)?;
                        if parents[state.0] != parents[i]
                            || matches!(states[state.0].kind, DefKind::History(_))
                        {
                            return Err(Error::InvalidHistoryDefault {
                                history: def.name.clone(),
                                default: name.to_string(),
                            });
                        }
                        Some(state)
                    }
                };
                StateKind::History { mode, default }
            }
        };

        nodes.push(StateNode {
            id: StateId(i),
            name: def.name.clone(),
            parent: parents[i],
            children: std::mem::take(&mut children[i]),
            kind,
            active: false,
            transitions: Vec::new(),
            memory: None,
        });
    }

    let mut compiled = Vec::with_capacity(transitions.len());
    for (i, def) in transitions.iter().enumerate() {
        let source = lookup(def.source.as_str())?;
        let name = def
            .name
            .clone()
            .unwrap_or_else(|| format!("{}->{}", def.source, def.targets.join(",")));

        if nodes[source.0].is_history() {
            return Err(Error::InvalidTransitionSource(def.source.clone()));
        }
        if def.targets.is_empty() {
            return Err(Error::MissingTarget(name));
        }
        let targets = def
            .targets
            .iter()
            .map(|t| lookup(t.as_str()))
            .collect::<Result<Vec<_>>>()?;
        if let Some(guard) = &def.guard {
            for state in guard.referenced_states() {
                lookup(state)?;
            }
        }

        let delay = match def.delay {
            Some(delay) => {
                delay.validate().map_err(|reason| Error::InvalidDelay {
                    transition: name.clone(),
                    reason,
                })?;
                match delay {
                    Delay::Fixed(seconds) if seconds == 0.0 => None,
                    other => Some(other),
                }
            }
            None => None,
        };

        let id = TransitionId(i);
        nodes[source.0].transitions.push(id);
        compiled.push(Transition {
            id,
            name,
            source,
            trigger: def.trigger.clone(),
            guard: def.guard.clone(),
            delay,
            targets,
            reevaluate_on_every_frame: def.reevaluate_on_every_frame,
        });
    }

    let hierarchy = Hierarchy::new(nodes, compiled, root);

    for transition in hierarchy.transitions() {
        let targets = transition.targets();
        for (i, &a) in targets.iter().enumerate() {
            for &b in &targets[i + 1..] {
                if hierarchy.targets_conflict(a, b) {
                    return Err(Error::ConflictingTargets {
                        transition: transition.name().to_string(),
                    });
                }
            }
        }
    }

    Ok(hierarchy)
}
