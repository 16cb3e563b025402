//! Transitions between states

use crate::guard::Guard;
use crate::node::StateId;
use rand::Rng;
use std::fmt;

/// Stable handle of a transition inside one chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionId(pub(crate) usize);

impl TransitionId {
    /// Position of the transition in declaration order
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TransitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Countdown before a transition fires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Delay {
    /// Always the same number of seconds
    Fixed(f64),
    /// Sampled uniformly from `min..=max` every time the countdown starts
    Random {
        /// Lower bound in seconds
        min: f64,
        /// Upper bound in seconds
        max: f64,
    },
}

impl Delay {
    /// Seconds for one countdown
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        match *self {
            Delay::Fixed(seconds) => seconds,
            Delay::Random { min, max } if min == max => min,
            Delay::Random { min, max } => rng.gen_range(min..=max),
        }
    }

    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        match *self {
            Delay::Fixed(seconds) if !seconds.is_finite() || seconds < 0.0 => {
                Err(format!("{seconds} is not a non-negative number of seconds"))
            }
            Delay::Random { min, max }
                if !min.is_finite() || !max.is_finite() || min < 0.0 || max < min =>
            {
                Err(format!("{min}..={max} is not a valid range"))
            }
            _ => Ok(()),
        }
    }
}

/// An edge owned by its source state.
#[derive(Debug, Clone)]
pub struct Transition {
    pub(crate) id: TransitionId,
    pub(crate) name: String,
    pub(crate) source: StateId,
    pub(crate) trigger: Option<String>,
    pub(crate) guard: Option<Guard>,
    pub(crate) delay: Option<Delay>,
    pub(crate) targets: Vec<StateId>,
    pub(crate) reevaluate_on_every_frame: bool,
}

impl Transition {
    /// Handle of this transition
    pub fn id(&self) -> TransitionId {
        self.id
    }

    /// Name given at declaration, or `Source->Target` by default
    pub fn name(&self) -> &str {
        &self.name
    }

    /// State owning the transition
    pub fn source(&self) -> StateId {
        self.source
    }

    /// Event name, `None` for automatic transitions
    pub fn trigger(&self) -> Option<&str> {
        self.trigger.as_deref()
    }

    /// Guard, if any
    pub fn guard(&self) -> Option<&Guard> {
        self.guard.as_ref()
    }

    /// Delay, if any
    pub fn delay(&self) -> Option<Delay> {
        self.delay
    }

    /// Targets in declaration order
    pub fn targets(&self) -> &[StateId] {
        &self.targets
    }

    /// Whether a pending countdown re-checks the guard on every tick
    pub fn reevaluates_on_every_frame(&self) -> bool {
        self.reevaluate_on_every_frame
    }

    /// Eventless transitions are evaluated whenever the chart settles
    pub fn is_automatic(&self) -> bool {
        self.trigger.is_none()
    }

    /// Event passes only consider matching triggers, automatic passes only
    /// trigger-less transitions.
    pub fn matches(&self, event: Option<&str>) -> bool {
        self.trigger.as_deref() == event
    }
}
