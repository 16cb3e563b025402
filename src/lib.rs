//! # Hierarchical Statechart
//!
//! A statechart engine for games and other tick-driven hosts: nested states,
//! parallel regions, history, guarded and delayed transitions, all driven by
//! named events, polled properties and frame ticks.
//!
//! ## Features
//!
//! - 🌳 **Hierarchy**: atomic, compound, parallel and history states
//! - 🔒 **Guards**: expressions over a property store, composable with `AllOf`, `AnyOf`, `Not`
//! - ⏰ **Delayed Transitions**: fixed or randomized countdowns advanced by `process(delta)`
//! - 📬 **Sequential Events**: events sent while the chart is busy are queued, never re-entered
//! - 🎲 **Turn-Based Stepping**: `step()` broadcasts to the active configuration without event semantics
//! - 📊 **PlantUML Export**: diagram of the hierarchy (debug builds only)
//!
//! ## Quick Start
//!
//! ```rust
//! use hierarchical_statechart::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let mut chart = StateChartBuilder::new(0u32)
//!     .states([
//!         StateDef::compound("Root").initial("Idle"),
//!         StateDef::atomic("Idle").parent("Root"),
//!         StateDef::atomic("Poisoned").parent("Root"),
//!     ])
//!     .transitions([
//!         TransitionDef::new("Idle").on("poisoned").to("Poisoned"),
//!         TransitionDef::new("Poisoned").on("cured").to("Idle"),
//!     ])
//!     .build()?;
//!
//! chart.on("Poisoned", NotificationKind::Stepped, |scope, _| {
//!     *scope.context_mut() += 1;
//! })?;
//!
//! chart.init()?;
//! chart.send_event("poisoned");
//! chart.step();
//! chart.step();
//! assert_eq!(*chart.context(), 2);
//!
//! chart.send_event("cured");
//! assert!(chart.is_state_active("Idle"));
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

pub use async_trait::async_trait;

mod builder;
mod chart;
mod clock;
mod config;
mod diagnostics;
mod error;
mod expression;
mod guard;
mod hierarchy;
mod node;
mod observer;
mod property;
mod scope;
mod stepper;
mod timer;
mod transition;

#[cfg(all(feature = "plantuml", debug_assertions))]
mod plantuml;

pub use builder::{StateChartBuilder, StateDef, TransitionDef};
#[cfg(all(feature = "plantuml", debug_assertions))]
pub use chart::TransitionRecord;
pub use chart::StateChart;
#[cfg(feature = "tokio-integration")]
pub use clock::IntervalClock;
pub use clock::{FixedClock, FrameClock};
pub use config::{ChartConfig, DelayPolicy};
pub use diagnostics::Diagnostic;
pub use error::{Error, GuardError, Result};
pub use expression::{ComparisonEvaluator, ExpressionEvaluator};
pub use guard::{Guard, GuardEnv};
pub use node::{HistoryMode, StateId, StateKind, StateNode};
pub use observer::{EventHandler, Notification, NotificationKind, StateHandler, TransitionHandler};
pub use property::{PropertyStore, Scalar};
pub use scope::Scope;
pub use timer::PendingTransition;
pub use transition::{Delay, Transition, TransitionId};

#[cfg(feature = "tokio-integration")]
#[cfg_attr(docsrs, doc(cfg(feature = "tokio-integration")))]
pub use tokio::time::Duration;

#[cfg(not(feature = "tokio-integration"))]
pub use std::time::Duration;

pub mod prelude {
    //! Prelude module for convenient imports
    pub use crate::{
        ChartConfig, DelayPolicy, Error, FixedClock, FrameClock, Guard, Notification,
        NotificationKind, Result, Scalar, Scope, StateChart, StateChartBuilder, StateDef,
        StateId, TransitionDef,
    };
    pub use async_trait::async_trait;
    pub use std::time::Duration;
}
