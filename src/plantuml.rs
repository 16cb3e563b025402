//! PlantUML diagram generation

use crate::guard::Guard;
use crate::hierarchy::Hierarchy;
use crate::node::{HistoryMode, StateId, StateKind};
use crate::transition::{Delay, Transition, TransitionId};
use std::collections::HashSet;

/// Generate a PlantUML diagram of the hierarchy. Transitions in `taken` are drawn bold.
pub(crate) fn generate_plantuml(hierarchy: &Hierarchy, taken: &HashSet<TransitionId>) -> String {
    let mut plantuml = String::new();
    plantuml.push_str("@startuml\n");
    plantuml.push_str("skinparam state {\n");
    plantuml.push_str("  BackgroundColor<<Current>> YellowGreen\n");
    plantuml.push_str("}\n\n");

    let root = hierarchy.root();
    plantuml.push_str(&format!("[*] --> {}\n", alias(root)));
    write_state(hierarchy, root, 0, &mut plantuml);
    plantuml.push('\n');

    for transition in hierarchy.transitions() {
        let arrow = if taken.contains(&transition.id()) {
            "-[bold]->"
        } else {
            "-->"
        };
        let label = label(transition);
        for &target in transition.targets() {
            let line = format!(
                "{} {} {}",
                alias(transition.source()),
                arrow,
                target_ref(hierarchy, target)
            );
            match &label {
                Some(label) => plantuml.push_str(&format!("{line} : {label}\n")),
                None => plantuml.push_str(&format!("{line}\n")),
            }
        }
    }

    plantuml.push_str("@enduml\n");
    plantuml
}

fn alias(id: StateId) -> String {
    format!("s{}", id.index())
}

fn write_state(hierarchy: &Hierarchy, id: StateId, depth: usize, out: &mut String) {
    let node = hierarchy.node(id);
    let indent = "  ".repeat(depth);
    let current = if node.is_active() { " <<Current>>" } else { "" };
    let header = format!("{indent}state \"{}\" as {}{current}", node.name(), alias(id));

    let children: Vec<StateId> = node
        .children()
        .iter()
        .copied()
        .filter(|&c| !hierarchy.node(c).is_history())
        .collect();
    if children.is_empty() {
        out.push_str(&header);
        out.push('\n');
        return;
    }

    out.push_str(&header);
    out.push_str(" {\n");
    let inner = "  ".repeat(depth + 1);
    if let StateKind::Compound { initial } = node.kind() {
        out.push_str(&format!("{inner}[*] --> {}\n", alias(*initial)));
    }
    let parallel = matches!(node.kind(), StateKind::Parallel);
    for (i, &child) in children.iter().enumerate() {
        if parallel && i > 0 {
            out.push_str(&format!("{inner}--\n"));
        }
        write_state(hierarchy, child, depth + 1, out);
    }
    out.push_str(&format!("{indent}}}\n"));
}

/// History nodes are drawn as the history pseudo state of their parent
fn target_ref(hierarchy: &Hierarchy, target: StateId) -> String {
    let node = hierarchy.node(target);
    match (node.kind(), node.parent()) {
        (StateKind::History { mode, .. }, Some(parent)) => {
            let marker = match mode {
                HistoryMode::Shallow => "[H]",
                HistoryMode::Deep => "[H*]",
            };
            format!("{}{marker}", alias(parent))
        }
        _ => alias(target),
    }
}

fn label(transition: &Transition) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(trigger) = transition.trigger() {
        parts.push(trigger.to_string());
    }
    if let Some(guard) = transition.guard() {
        parts.push(format!("[{}]", describe_guard(guard)));
    }
    if let Some(delay) = transition.delay() {
        let after = match delay {
            Delay::Fixed(seconds) => format!("{seconds}s"),
            Delay::Random { min, max } => format!("{min}..{max}s"),
        };
        parts.push(format!("/ after({after})"));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

fn describe_guard(guard: &Guard) -> String {
    let join = |guards: &[Guard], op: &str| {
        let inner: Vec<String> = guards.iter().map(describe_guard).collect();
        format!("({})", inner.join(op))
    };
    match guard {
        Guard::Expression(expression) => expression.clone(),
        Guard::StateActive(state) => format!("in {state}"),
        Guard::AllOf(guards) => join(guards, " && "),
        Guard::AnyOf(guards) => join(guards, " || "),
        Guard::Not(inner) => format!("!{}", describe_guard(inner)),
    }
}
