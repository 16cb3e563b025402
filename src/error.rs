//! Error types for the statechart

use crate::node::StateId;
use crate::transition::TransitionId;
use thiserror::Error;

/// Result type alias for chart construction and lifecycle operations
pub type Result<T> = std::result::Result<T, Error>;

/// Structural errors. These are detected while building or initializing a chart
/// and are always fatal: the chart is rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// No states were declared
    #[error("Chart has no states")]
    EmptyChart,

    /// Every declared state has a parent, so nothing can act as the root
    #[error("Chart has no root state")]
    MissingRoot,

    /// More than one state was declared without a parent
    #[error("Chart has more than one root state: {0:?}")]
    MultipleRoots(Vec<String>),

    /// Two states share a name
    #[error("State {0:?} declared more than once")]
    DuplicateState(String),

    /// A parent, target, initial child or guard refers to a state that was never declared
    #[error("State {0:?} not declared")]
    UnknownState(String),

    /// A state id handed in by the caller belongs to a different chart
    #[error("{0:?} does not belong to this chart")]
    ForeignState(StateId),

    /// A transition id handed in by the caller belongs to a different chart
    #[error("{0:?} does not belong to this chart")]
    ForeignTransition(TransitionId),

    /// Following parent links from this state never reaches a root
    #[error("State {0:?} is part of a parent cycle")]
    CyclicHierarchy(String),

    /// Only compound and parallel states can have children
    #[error("State {child:?} cannot be a child of {parent:?}")]
    InvalidParent {
        /// The child state
        child: String,
        /// The atomic or history state it was attached to
        parent: String,
    },

    /// A compound state was declared without an initial child
    #[error("Compound state {0:?} has no initial state")]
    MissingInitialState(String),

    /// The initial child is not a direct, non-history child of the compound state
    #[error("State {initial:?} is not a valid initial state of {state:?}")]
    InvalidInitialState {
        /// The compound state
        state: String,
        /// The offending initial child
        initial: String,
    },

    /// History states must live directly under a compound state
    #[error("History state {0:?} must be a direct child of a compound state")]
    HistoryOutsideCompound(String),

    /// The default of a history state must be a non-history sibling
    #[error("State {default:?} is not a valid default for history state {history:?}")]
    InvalidHistoryDefault {
        /// The history state
        history: String,
        /// The offending default state
        default: String,
    },

    /// History states are pseudo states and never own transitions
    #[error("History state {0:?} cannot be the source of a transition")]
    InvalidTransitionSource(String),

    /// A transition was declared without a target
    #[error("Transition {0:?} has no target")]
    MissingTarget(String),

    /// The targets of one transition would activate two children of the same compound state
    #[error("Targets of transition {transition:?} conflict with each other")]
    ConflictingTargets {
        /// The transition name
        transition: String,
    },

    /// A delay is negative, not finite, or an empty random range
    #[error("Transition {transition:?} has an invalid delay: {reason}")]
    InvalidDelay {
        /// The transition name
        transition: String,
        /// What is wrong with it
        reason: String,
    },

    /// `init` was called on a chart that is already running
    #[error("Chart already initialized")]
    AlreadyInitialized,
}

/// Errors raised while evaluating a guard.
///
/// These never abort the chart; the dispatcher treats them as a failing guard and
/// reports them as a [`Diagnostic`](crate::Diagnostic).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GuardError {
    /// The expression reads a property that was never set
    #[error("Unknown property {0:?}")]
    UnknownProperty(String),

    /// The expression could not be parsed
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// The operands of a comparison cannot be compared
    #[error("Cannot compare {left} with {right}")]
    TypeMismatch {
        /// Left operand as written
        left: String,
        /// Right operand as written
        right: String,
    },

    /// A state-active guard names an unknown state
    #[error("Unknown state {0:?}")]
    UnknownState(String),

    /// Generic error for custom evaluators
    #[error("Custom error: {0}")]
    Custom(String),
}
