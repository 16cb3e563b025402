//! The static state tree and the walks over it.
//!
//! Nodes and transitions live in flat arenas indexed by [`StateId`] and
//! [`TransitionId`]. Only the active flags and history memories change after the
//! chart is built. Nothing in here emits notifications; the dispatcher plans
//! exits and entries with these helpers and then applies them.

use crate::node::{HistoryMemory, HistoryMode, StateId, StateKind, StateNode};
use crate::transition::{Transition, TransitionId};
use std::collections::HashMap;

#[derive(Debug)]
pub(crate) struct Hierarchy {
    nodes: Vec<StateNode>,
    transitions: Vec<Transition>,
    names: HashMap<String, StateId>,
    transition_names: HashMap<String, TransitionId>,
    root: StateId,
}

impl Hierarchy {
    pub(crate) fn new(nodes: Vec<StateNode>, transitions: Vec<Transition>, root: StateId) -> Self {
        let names = nodes.iter().map(|n| (n.name.clone(), n.id)).collect();
        let mut transition_names = HashMap::new();
        for t in &transitions {
            transition_names.entry(t.name.clone()).or_insert(t.id);
        }
        Self {
            nodes,
            transitions,
            names,
            transition_names,
            root,
        }
    }

    pub(crate) fn root(&self) -> StateId {
        self.root
    }

    pub(crate) fn node(&self, id: StateId) -> &StateNode {
        &self.nodes[id.0]
    }

    pub(crate) fn get_node(&self, id: StateId) -> Option<&StateNode> {
        self.nodes.get(id.0)
    }

    pub(crate) fn nodes(&self) -> &[StateNode] {
        &self.nodes
    }

    pub(crate) fn transition(&self, id: TransitionId) -> &Transition {
        &self.transitions[id.0]
    }

    pub(crate) fn get_transition(&self, id: TransitionId) -> Option<&Transition> {
        self.transitions.get(id.0)
    }

    pub(crate) fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub(crate) fn state_id(&self, name: &str) -> Option<StateId> {
        self.names.get(name).copied()
    }

    pub(crate) fn transition_id(&self, name: &str) -> Option<TransitionId> {
        self.transition_names.get(name).copied()
    }

    /// Ids from another chart are never active
    pub(crate) fn is_active(&self, id: StateId) -> bool {
        self.nodes.get(id.0).is_some_and(|n| n.active)
    }

    pub(crate) fn set_active(&mut self, id: StateId, active: bool) {
        self.nodes[id.0].active = active;
    }

    /// True when `ancestor` is `node` or lies on its parent chain.
    pub(crate) fn is_ancestor_or_self(&self, ancestor: StateId, node: StateId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes[id.0].parent;
        }
        false
    }

    /// Deepest node that is an ancestor-or-self of both `a` and `b`.
    pub(crate) fn common_ancestor(&self, a: StateId, b: StateId) -> StateId {
        let mut current = Some(a);
        while let Some(id) = current {
            if self.is_ancestor_or_self(id, b) {
                return id;
            }
            current = self.nodes[id.0].parent;
        }
        self.root
    }

    /// The active child of a compound state. History children never count.
    pub(crate) fn active_child(&self, id: StateId) -> Option<StateId> {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes[c.0].active)
    }

    /// Active configuration in pre-order: parents before children, siblings in
    /// declaration order.
    pub(crate) fn active_states(&self) -> Vec<StateId> {
        let mut out = Vec::new();
        if self.is_active(self.root) {
            out.push(self.root);
            self.collect_active_descendants(self.root, &mut out);
        }
        out
    }

    /// Active states without active children.
    pub(crate) fn active_leaves(&self) -> Vec<StateId> {
        self.active_states()
            .into_iter()
            .filter(|&id| self.active_child(id).is_none())
            .collect()
    }

    fn collect_active_descendants(&self, id: StateId, out: &mut Vec<StateId>) {
        for &child in &self.nodes[id.0].children {
            if self.nodes[child.0].active {
                out.push(child);
                self.collect_active_descendants(child, out);
            }
        }
    }

    /// Transitions of `state` matching `event` whose guard passes, in declaration
    /// order. Guards are evaluated lazily, so taking the first item only checks as
    /// many guards as needed.
    pub(crate) fn enabled_transitions<'a, F>(
        &'a self,
        state: StateId,
        event: Option<&'a str>,
        mut passes: F,
    ) -> impl Iterator<Item = TransitionId> + 'a
    where
        F: FnMut(&Transition) -> bool + 'a,
    {
        self.nodes[state.0]
            .transitions
            .iter()
            .map(move |&t| &self.transitions[t.0])
            .filter(move |t| t.matches(event))
            .filter(move |t| passes(*t))
            .map(|t| t.id)
    }

    /// One resolution pass: innermost active states first, at most one transition
    /// per independent region, declaration order as the tie-break.
    pub(crate) fn select_transitions(
        &self,
        event: Option<&str>,
        passes: &mut dyn FnMut(&Transition) -> bool,
    ) -> Vec<TransitionId> {
        let mut selected = Vec::new();
        self.select_in(self.root, event, passes, &mut selected);
        selected
    }

    fn select_in(
        &self,
        id: StateId,
        event: Option<&str>,
        passes: &mut dyn FnMut(&Transition) -> bool,
        selected: &mut Vec<TransitionId>,
    ) -> bool {
        let node = &self.nodes[id.0];
        if !node.active {
            return false;
        }

        let handled_below = match node.kind {
            StateKind::Atomic | StateKind::History { .. } => false,
            StateKind::Compound { .. } => match self.active_child(id) {
                Some(child) => self.select_in(child, event, passes, selected),
                None => false,
            },
            StateKind::Parallel => {
                let mut handled = false;
                for &child in &node.children {
                    // every region gets its own walk
                    handled |= self.select_in(child, event, passes, selected);
                }
                handled
            }
        };
        if handled_below {
            return true;
        }

        match self.enabled_transitions(id, event, &mut *passes).next() {
            Some(transition) => {
                selected.push(transition);
                true
            }
            None => false,
        }
    }

    /// Deepest compound proper ancestor of the source containing every target.
    /// Falls back to the root, which is never exited.
    pub(crate) fn domain(&self, id: TransitionId) -> StateId {
        let transition = &self.transitions[id.0];
        let mut candidate = self.nodes[transition.source.0].parent;
        while let Some(c) = candidate {
            let node = &self.nodes[c.0];
            if matches!(node.kind, StateKind::Compound { .. })
                && transition
                    .targets
                    .iter()
                    .all(|&t| self.is_ancestor_or_self(c, t))
            {
                return c;
            }
            candidate = node.parent;
        }
        self.root
    }

    /// Active proper descendants of `domain`, children before parents.
    pub(crate) fn exit_set(&self, domain: StateId) -> Vec<StateId> {
        let mut out = Vec::new();
        self.collect_exit(domain, &mut out);
        out
    }

    fn collect_exit(&self, id: StateId, out: &mut Vec<StateId>) {
        for &child in &self.nodes[id.0].children {
            if self.nodes[child.0].active {
                self.collect_exit(child, out);
                out.push(child);
            }
        }
    }

    /// States to enter below `domain` so that every target ends up active, parents
    /// before children. An inactive domain (the root on initialization) is
    /// included itself.
    pub(crate) fn entry_set(&self, domain: StateId, targets: &[StateId]) -> Vec<StateId> {
        let mut out = Vec::new();
        if !self.is_active(domain) {
            out.push(domain);
        }
        self.plan_children(domain, targets, &mut out);
        out
    }

    fn plan_entry(&self, id: StateId, targets: &[StateId], out: &mut Vec<StateId>) {
        out.push(id);
        self.plan_children(id, targets, out);
    }

    fn plan_children(&self, id: StateId, targets: &[StateId], out: &mut Vec<StateId>) {
        let node = &self.nodes[id.0];
        match node.kind {
            StateKind::Atomic | StateKind::History { .. } => {}
            StateKind::Parallel => {
                for &child in &node.children {
                    self.plan_child(child, targets, out);
                }
            }
            StateKind::Compound { initial } => {
                let next = node
                    .children
                    .iter()
                    .copied()
                    .find(|&c| targets.iter().any(|&t| self.is_ancestor_or_self(c, t)))
                    .unwrap_or(initial);
                self.plan_child(next, targets, out);
            }
        }
    }

    fn plan_child(&self, id: StateId, targets: &[StateId], out: &mut Vec<StateId>) {
        if self.nodes[id.0].is_history() {
            self.plan_history(id, out);
        } else {
            self.plan_entry(id, targets, out);
        }
    }

    fn plan_history(&self, id: StateId, out: &mut Vec<StateId>) {
        let node = &self.nodes[id.0];
        let StateKind::History { mode, default } = node.kind else {
            return;
        };

        match (&node.memory, mode) {
            (Some(memory), HistoryMode::Shallow) => self.plan_entry(memory.child, &[], out),
            (Some(memory), HistoryMode::Deep) => {
                self.plan_entry(memory.child, &memory.descendants, out)
            }
            (None, _) => {
                let fallback = default.or_else(|| {
                    node.parent.and_then(|p| match self.nodes[p.0].kind {
                        StateKind::Compound { initial } => Some(initial),
                        _ => None,
                    })
                });
                if let Some(state) = fallback {
                    self.plan_entry(state, &[], out);
                }
            }
        }
    }

    /// Stores the configuration of every exiting compound state into its history
    /// children. Must run before the exiting states are deactivated.
    pub(crate) fn record_history(&mut self, exiting: &[StateId]) {
        for &id in exiting {
            if !matches!(self.nodes[id.0].kind, StateKind::Compound { .. }) {
                continue;
            }
            let histories: Vec<StateId> = self.nodes[id.0]
                .children
                .iter()
                .copied()
                .filter(|&c| self.nodes[c.0].is_history())
                .collect();
            if histories.is_empty() {
                continue;
            }
            let Some(child) = self.active_child(id) else {
                continue;
            };
            let mut descendants = Vec::new();
            self.collect_active_descendants(id, &mut descendants);

            for history in histories {
                self.nodes[history.0].memory = Some(HistoryMemory {
                    child,
                    descendants: descendants.clone(),
                });
            }
        }
    }

    /// Whether two targets of one transition would need two children of the same
    /// compound state active at once.
    pub(crate) fn targets_conflict(&self, a: StateId, b: StateId) -> bool {
        if self.is_ancestor_or_self(a, b) || self.is_ancestor_or_self(b, a) {
            return false;
        }
        let common = self.common_ancestor(a, b);
        !matches!(self.nodes[common.0].kind, StateKind::Parallel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Root (compound, initial A)
    // ├── A (compound, initial A1)
    // │   ├── A1
    // │   ├── A2
    // │   └── H (deep history)
    // └── P (parallel)
    //     ├── X (compound, initial X1) ── X1, X2
    //     └── Y
    fn tree() -> Hierarchy {
        let layout: &[(&str, Option<usize>, StateKind)] = &[
            ("Root", None, StateKind::Compound { initial: StateId(1) }),
            ("A", Some(0), StateKind::Compound { initial: StateId(2) }),
            ("A1", Some(1), StateKind::Atomic),
            ("A2", Some(1), StateKind::Atomic),
            (
                "H",
                Some(1),
                StateKind::History {
                    mode: HistoryMode::Deep,
                    default: None,
                },
            ),
            ("P", Some(0), StateKind::Parallel),
            ("X", Some(5), StateKind::Compound { initial: StateId(7) }),
            ("X1", Some(6), StateKind::Atomic),
            ("X2", Some(6), StateKind::Atomic),
            ("Y", Some(5), StateKind::Atomic),
        ];
        let mut nodes: Vec<StateNode> = layout
            .iter()
            .enumerate()
            .map(|(i, (name, parent, kind))| StateNode {
                id: StateId(i),
                name: name.to_string(),
                parent: parent.map(StateId),
                children: Vec::new(),
                kind: kind.clone(),
                active: false,
                transitions: Vec::new(),
                memory: None,
            })
            .collect();
        for i in 0..nodes.len() {
            if let Some(p) = nodes[i].parent {
                nodes[p.0].children.push(StateId(i));
            }
        }
        Hierarchy::new(nodes, Vec::new(), StateId(0))
    }

    fn names(h: &Hierarchy, ids: &[StateId]) -> Vec<String> {
        ids.iter().map(|&id| h.node(id).name.clone()).collect()
    }

    fn activate(h: &mut Hierarchy, ids: &[StateId]) {
        for &id in ids {
            h.set_active(id, true);
        }
    }

    #[test]
    fn initial_entry_cascades_to_leaves() {
        let h = tree();
        let entry = h.entry_set(h.root(), &[]);
        assert_eq!(names(&h, &entry), vec!["Root", "A", "A1"]);
    }

    #[test]
    fn entering_parallel_enters_every_region() {
        let mut h = tree();
        let entry = h.entry_set(h.root(), &[]);
        activate(&mut h, &entry);

        let entry = h.entry_set(h.root(), &[StateId(5)]);
        assert_eq!(names(&h, &entry), vec!["P", "X", "X1", "Y"]);

        let entry = h.entry_set(h.root(), &[StateId(8)]);
        assert_eq!(names(&h, &entry), vec!["P", "X", "X2", "Y"]);
    }

    #[test]
    fn exit_set_is_children_first() {
        let mut h = tree();
        activate(&mut h, &[StateId(0), StateId(5), StateId(6), StateId(7), StateId(9)]);
        let exit = h.exit_set(h.root());
        assert_eq!(names(&h, &exit), vec!["X1", "X", "Y", "P"]);
        assert_eq!(names(&h, &h.active_leaves()), vec!["X1", "Y"]);
    }

    #[test]
    fn deep_history_restores_recorded_subtree() {
        let mut h = tree();
        activate(&mut h, &[StateId(0), StateId(1), StateId(3)]);

        let exit = h.exit_set(h.root());
        h.record_history(&exit);
        for id in exit {
            h.set_active(id, false);
        }

        let entry = h.entry_set(h.root(), &[StateId(4)]);
        assert_eq!(names(&h, &entry), vec!["A", "A2"]);
    }

    #[test]
    fn history_without_memory_falls_back_to_initial() {
        let mut h = tree();
        activate(&mut h, &[StateId(0), StateId(5), StateId(6), StateId(7), StateId(9)]);
        let entry = h.entry_set(h.root(), &[StateId(4)]);
        assert_eq!(names(&h, &entry), vec!["A", "A1"]);
    }

    #[test]
    fn ancestry_and_conflicts() {
        let h = tree();
        assert!(h.is_ancestor_or_self(StateId(0), StateId(8)));
        assert!(h.is_ancestor_or_self(StateId(8), StateId(8)));
        assert!(!h.is_ancestor_or_self(StateId(1), StateId(8)));
        assert_eq!(h.common_ancestor(StateId(7), StateId(9)), StateId(5));

        // X2 and Y sit in different regions of P
        assert!(!h.targets_conflict(StateId(8), StateId(9)));
        // A1 and A2 are siblings in a compound state
        assert!(h.targets_conflict(StateId(2), StateId(3)));
        assert!(!h.targets_conflict(StateId(1), StateId(3)));
    }
}
