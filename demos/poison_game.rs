//! Turn-based poison example
//!
//! A player alternates between Healthy and Poisoned. While poisoned, every
//! round (a `step`) costs one health point per stack of poison, and the poison
//! wears off by itself once the `poison_count` property drops to zero.
//! An antidote (`cured`) ends it early. A history state lets the player return
//! to whatever stance they had before being knocked down.
//!
//! Run with: cargo run --example poison_game

use hierarchical_statechart::prelude::*;

#[derive(Debug)]
struct Player {
    health: i32,
    round: u32,
}

fn build_chart() -> Result<StateChart<Player>> {
    StateChartBuilder::new(Player {
        health: 20,
        round: 0,
    })
    .states([
        StateDef::parallel("Root"),
        StateDef::compound("Condition").parent("Root").initial("Healthy"),
        StateDef::atomic("Healthy").parent("Condition"),
        StateDef::atomic("Poisoned").parent("Condition"),
        StateDef::compound("Posture").parent("Root").initial("Up"),
        StateDef::compound("Up").parent("Posture").initial("Standing"),
        StateDef::atomic("Standing").parent("Up"),
        StateDef::atomic("Guarding").parent("Up"),
        StateDef::history("LastStance").parent("Up"),
        StateDef::atomic("KnockedDown").parent("Posture"),
    ])
    .transitions([
        TransitionDef::new("Healthy").on("poisoned").to("Poisoned"),
        TransitionDef::new("Poisoned").on("poisoned").to("Poisoned").named("more poison"),
        TransitionDef::new("Poisoned").on("cured").to("Healthy"),
        TransitionDef::new("Poisoned")
            .to("Healthy")
            .when("poison_count <= 0")
            .named("poison wore off"),
        TransitionDef::new("Standing").on("guard").to("Guarding"),
        TransitionDef::new("Up").on("hit").to("KnockedDown"),
        TransitionDef::new("KnockedDown").on("next_round").to("LastStance"),
    ])
    .property("poison_count", 0)
    .build()
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut chart = build_chart()?;

    chart.on("Poisoned", NotificationKind::Entered, |scope, _| {
        let stacks = scope.property("poison_count", 0).as_f64().unwrap_or(0.0) + 3.0;
        scope.set_property("poison_count", stacks);
        println!("  -> poisoned! ({stacks} rounds of poison)");
    })?;
    chart.on("Poisoned", NotificationKind::Stepped, |scope, _| {
        let stacks = scope.property("poison_count", 0).as_f64().unwrap_or(0.0);
        scope.context_mut().health -= 1;
        scope.set_property("poison_count", stacks - 1.0);
        println!("  poison deals 1 damage, {} rounds left", stacks - 1.0);
    })?;
    chart.on("Healthy", NotificationKind::Entered, |scope, _| {
        scope.set_property("poison_count", 0);
    })?;
    chart.on("Root", NotificationKind::Stepped, |scope, _| {
        scope.context_mut().round += 1;
    })?;
    chart.on("KnockedDown", NotificationKind::Entered, |_, _| {
        println!("  -> knocked down");
    })?;
    chart.on_event_received(|scope, event| {
        let round = scope.context().round;
        println!("round {round}: {event}");
    });

    chart.init()?;

    let script: &[&[&str]] = &[
        &["guard"],
        &["poisoned"],
        &[],
        &["hit"],
        &["next_round"],
        &["poisoned"],
        &[],
        &["cured"],
        &[],
    ];
    for events in script {
        for event in *events {
            chart.send_event(*event);
        }
        chart.step();

        let leaves: Vec<&str> = chart
            .active_leaves()
            .into_iter()
            .map(|id| chart.state_name(id))
            .collect();
        println!(
            "  health {:>2} | {}",
            chart.context().health,
            leaves.join(", ")
        );
    }

    println!("\n{}", chart.export_plantuml());
    Ok(())
}
