//! Runtime options of a chart

/// What happens to a running countdown whose transition re-checks its guard on
/// every tick and finds it failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DelayPolicy {
    /// Cancel the countdown. It starts over from a fresh delay once the guard passes again.
    #[default]
    Reset,
    /// Hold the countdown and resume from the remaining time once the guard passes again.
    Pause,
}

/// Options passed to [`StateChartBuilder::config`](crate::StateChartBuilder::config).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChartConfig {
    /// Upper bound on consecutive automatic passes while the chart settles.
    /// Reaching it stops the sweep and reports a diagnostic.
    pub max_settle_iterations: usize,
    /// Countdown behaviour for transitions that re-check their guard every tick
    pub delay_policy: DelayPolicy,
    /// Seed for randomized delays; `None` seeds from entropy
    pub rng_seed: Option<u64>,
    /// Unread diagnostics kept before newer ones are dropped
    pub diagnostic_capacity: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            max_settle_iterations: 100,
            delay_policy: DelayPolicy::Reset,
            rng_seed: None,
            diagnostic_capacity: 64,
        }
    }
}
