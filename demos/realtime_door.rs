//! Real-time automatic door example
//!
//! The door is driven by a tokio interval clock. It opens on `approach`, stays
//! open for a while once nobody is around, and refuses to close while the
//! `blocked` property is set. The close countdown re-checks its guard on every
//! frame, so blocking the doorway restarts it.
//!
//! Run with: cargo run --example realtime_door --features plantuml,tokio-integration

use hierarchical_statechart::prelude::*;
use hierarchical_statechart::{Diagnostic, IntervalClock};

#[derive(Debug, Default)]
struct Door {
    cycles: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let mut chart = StateChartBuilder::new(Door::default())
        .states([
            StateDef::compound("Door").initial("Closed"),
            StateDef::atomic("Closed").parent("Door"),
            StateDef::atomic("Opening").parent("Door"),
            StateDef::atomic("Open").parent("Door"),
            StateDef::atomic("Closing").parent("Door"),
        ])
        .transitions([
            TransitionDef::new("Closed").on("approach").to("Opening"),
            TransitionDef::new("Opening").to("Open").delay(0.3),
            TransitionDef::new("Open")
                .to("Closing")
                .when("!blocked")
                .delay(0.5)
                .reevaluate_on_every_frame()
                .named("auto close"),
            TransitionDef::new("Closing").to("Closed").random_delay(0.2, 0.4),
            TransitionDef::new("Closing").on("approach").to("Opening"),
        ])
        .property("blocked", false)
        .config(ChartConfig {
            delay_policy: DelayPolicy::Reset,
            ..ChartConfig::default()
        })
        .build()?;

    chart.on("Open", NotificationKind::TransitionPending, |_, n| {
        if let Notification::TransitionPending { initial, remaining } = n {
            println!("  closing in {remaining:.2}s of {initial:.2}s");
        }
    })?;
    chart.on("Closed", NotificationKind::Entered, |scope, _| {
        scope.context_mut().cycles += 1;
    })?;

    let diagnostics = chart.diagnostics();
    chart.init()?;

    let mut clock = IntervalClock::new(Duration::from_millis(100));

    chart.send_event("approach");
    chart.run_frames(&mut clock, 6).await;

    println!("someone stands in the doorway");
    chart.set_property("blocked", true);
    chart.run_frames(&mut clock, 8).await;

    println!("doorway clear");
    chart.set_property("blocked", false);
    chart.run_frames(&mut clock, 15).await;

    println!(
        "door closed {} times, now {:?}",
        chart.context().cycles,
        chart
            .active_leaves()
            .iter()
            .map(|&id| chart.state_name(id))
            .collect::<Vec<_>>()
    );

    for diagnostic in diagnostics.try_iter() {
        if let Diagnostic::GuardFailed { transition, error } = diagnostic {
            println!("guard of {transition} failed: {error}");
        }
    }

    println!("\n{}", chart.export_plantuml());
    Ok(())
}
