use hierarchical_statechart::{StateChart, StateChartBuilder, StateDef, StateKind, TransitionDef};
use proptest::prelude::*;

const EVENTS: [&str; 3] = ["a", "b", "c"];

#[derive(Debug, Clone)]
struct Blueprint {
    states: Vec<StateDef>,
    transitions: Vec<TransitionDef>,
}

fn name(i: usize) -> String {
    format!("S{i}")
}

/// Turns raw random numbers into a well-formed hierarchy: every node hangs below
/// an earlier container, empty containers become leaves and compound states may
/// get a history child.
fn blueprint(
    shape: Vec<(usize, u8)>,
    histories: Vec<bool>,
    edges: Vec<(usize, usize, usize)>,
) -> Blueprint {
    let count = shape.len() + 1;
    let mut kinds = vec![1u8; count];
    let mut parents = vec![None; count];
    let mut containers = vec![0usize];
    for (i, &(choice, kind)) in shape.iter().enumerate() {
        let id = i + 1;
        parents[id] = Some(containers[choice % containers.len()]);
        kinds[id] = kind % 3;
        if kinds[id] != 0 {
            containers.push(id);
        }
    }

    let mut children = vec![Vec::new(); count];
    for id in 1..count {
        if let Some(p) = parents[id] {
            children[p].push(id);
        }
    }

    let mut states = Vec::new();
    let mut history_names = Vec::new();
    for id in 0..count {
        let mut def = match (kinds[id], children[id].first()) {
            (_, None) | (0, _) => StateDef::atomic(name(id)),
            (1, Some(&first)) => StateDef::compound(name(id)).initial(name(first)),
            _ => StateDef::parallel(name(id)),
        };
        if let Some(p) = parents[id] {
            def = def.parent(name(p));
        }
        states.push(def);

        let compound = kinds[id] == 1 && !children[id].is_empty();
        if compound && histories[id % histories.len()] {
            let history = format!("H{id}");
            let mut def = StateDef::history(&history).parent(name(id));
            if id % 2 == 0 {
                def = def.deep();
            }
            states.push(def);
            history_names.push(history);
        }
    }

    let targets: Vec<String> = (0..count).map(name).chain(history_names).collect();
    let transitions = edges
        .into_iter()
        .map(|(source, target, event)| {
            let def = TransitionDef::new(name(source % count)).to(targets[target % targets.len()].clone());
            match EVENTS.get(event % (EVENTS.len() + 1)) {
                Some(event) => def.on(*event),
                None => def,
            }
        })
        .collect();

    Blueprint {
        states,
        transitions,
    }
}

prop_compose! {
    fn arb_blueprint()(
        shape in prop::collection::vec((0usize..16, 0u8..3), 0..12),
        histories in prop::collection::vec(any::<bool>(), 1..4),
        edges in prop::collection::vec((0usize..16, 0usize..32, 0usize..8), 0..16),
    ) -> Blueprint {
        blueprint(shape, histories, edges)
    }
}

fn build(blueprint: Blueprint) -> StateChart<()> {
    StateChartBuilder::new(())
        .states(blueprint.states)
        .transitions(blueprint.transitions)
        .build()
        .expect("generated hierarchies are well formed")
}

fn check_configuration(chart: &StateChart<()>) -> Result<(), TestCaseError> {
    prop_assert!(chart.is_active(chart.root()));
    for state in chart.states() {
        if let Some(parent) = state.parent() {
            prop_assert!(
                !state.is_active() || chart.is_active(parent),
                "{} is active below an inactive parent",
                state.name()
            );
        }
        if state.is_history() {
            prop_assert!(!state.is_active());
            continue;
        }
        if !state.is_active() {
            continue;
        }
        let active_children = state
            .children()
            .iter()
            .filter(|&&c| chart.is_active(c))
            .count();
        match state.kind() {
            StateKind::Compound { .. } => prop_assert_eq!(active_children, 1),
            StateKind::Parallel => prop_assert_eq!(active_children, state.children().len()),
            _ => prop_assert_eq!(active_children, 0),
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn initial_configuration_is_well_formed(blueprint in arb_blueprint()) {
        let mut chart = build(blueprint);
        chart.init().unwrap();
        check_configuration(&chart)?;
    }

    #[test]
    fn configuration_stays_well_formed_under_events(
        blueprint in arb_blueprint(),
        events in prop::collection::vec(0usize..3, 0..20),
    ) {
        let mut chart = build(blueprint);
        chart.init().unwrap();
        for event in events {
            chart.send_event(EVENTS[event]);
            check_configuration(&chart)?;
        }
    }

    #[test]
    fn unmatched_events_change_nothing(blueprint in arb_blueprint()) {
        let mut chart = build(blueprint);
        chart.init().unwrap();
        let before = chart.active_states();
        chart.send_event("never-declared");
        prop_assert_eq!(chart.active_states(), before);
    }
}
