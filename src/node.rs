//! State nodes of the hierarchy

use crate::transition::TransitionId;
use std::fmt;

/// Stable handle of a state inside one chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub(crate) usize);

impl StateId {
    /// Position of the state in declaration order
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How much of the parent's configuration a history state restores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryMode {
    /// Only the last active direct child, entered with its defaults
    #[default]
    Shallow,
    /// The whole active subtree as it was on the last exit
    Deep,
}

/// The closed set of node variants.
#[derive(Debug, Clone, PartialEq)]
pub enum StateKind {
    /// Leaf state
    Atomic,
    /// Exactly one child active while the state is active
    Compound {
        /// Child entered when nothing more specific is targeted
        initial: StateId,
    },
    /// All children active while the state is active
    Parallel,
    /// Pseudo state remembering the configuration of its compound parent
    History {
        /// Shallow or deep recall
        mode: HistoryMode,
        /// Sibling entered when nothing was recorded yet
        default: Option<StateId>,
    },
}

impl StateKind {
    /// Short name, used in logs and diagrams
    pub fn label(&self) -> &'static str {
        match self {
            StateKind::Atomic => "atomic",
            StateKind::Compound { .. } => "compound",
            StateKind::Parallel => "parallel",
            StateKind::History { .. } => "history",
        }
    }
}

/// What a history state recorded on the last exit of its parent.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HistoryMemory {
    /// Active child of the parent at exit time
    pub child: StateId,
    /// Every active descendant of the parent at exit time
    pub descendants: Vec<StateId>,
}

/// One element of the hierarchy.
///
/// Parents own their children through the chart's arena; `parent` is only a
/// back reference used for path walks.
#[derive(Debug, Clone)]
pub struct StateNode {
    pub(crate) id: StateId,
    pub(crate) name: String,
    pub(crate) parent: Option<StateId>,
    pub(crate) children: Vec<StateId>,
    pub(crate) kind: StateKind,
    pub(crate) active: bool,
    pub(crate) transitions: Vec<TransitionId>,
    pub(crate) memory: Option<HistoryMemory>,
}

impl StateNode {
    /// Handle of this state
    pub fn id(&self) -> StateId {
        self.id
    }

    /// Declared name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent state, `None` for the root
    pub fn parent(&self) -> Option<StateId> {
        self.parent
    }

    /// Children in declaration order
    pub fn children(&self) -> &[StateId] {
        &self.children
    }

    /// Node variant
    pub fn kind(&self) -> &StateKind {
        &self.kind
    }

    /// Whether the state is part of the active configuration
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Owned transitions in declaration order
    pub fn transitions(&self) -> &[TransitionId] {
        &self.transitions
    }

    /// Whether this is a history pseudo state
    pub fn is_history(&self) -> bool {
        matches!(self.kind, StateKind::History { .. })
    }
}
