//! Frame clocks driving [`StateChart::process`]

use crate::chart::StateChart;
use crate::Duration;
use async_trait::async_trait;

/// Source of frame deltas.
///
/// Games usually get their deltas from an engine loop; this trait lets a chart
/// run on its own clock instead.
#[async_trait]
pub trait FrameClock: Send {
    /// Wait for the next frame and return the time elapsed since the previous one
    async fn tick(&mut self) -> Duration;
}

/// A clock that never waits and always reports the same delta.
///
/// Useful for turn-based hosts and deterministic tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedClock {
    delta: Duration,
}

impl FixedClock {
    /// Create a clock reporting `delta` on every tick
    pub fn new(delta: Duration) -> Self {
        Self { delta }
    }

    /// Delta reported on every tick
    pub fn delta(&self) -> Duration {
        self.delta
    }
}

#[async_trait]
impl FrameClock for FixedClock {
    async fn tick(&mut self) -> Duration {
        self.delta
    }
}

/// A clock ticking on a tokio interval and reporting the measured time between ticks.
///
/// Must be created inside a tokio runtime. Missed ticks are delayed rather than
/// bursted, so a slow frame shows up as one large delta.
#[cfg(feature = "tokio-integration")]
#[cfg_attr(docsrs, doc(cfg(feature = "tokio-integration")))]
#[derive(Debug)]
pub struct IntervalClock {
    interval: tokio::time::Interval,
    last: tokio::time::Instant,
}

#[cfg(feature = "tokio-integration")]
impl IntervalClock {
    /// Tick every `period`, starting one period from now
    pub fn new(period: Duration) -> Self {
        let start = tokio::time::Instant::now();
        let mut interval = tokio::time::interval_at(start + period, period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        Self {
            interval,
            last: start,
        }
    }
}

#[cfg(feature = "tokio-integration")]
#[async_trait]
impl FrameClock for IntervalClock {
    async fn tick(&mut self) -> Duration {
        self.interval.tick().await;
        let now = tokio::time::Instant::now();
        let delta = now.duration_since(self.last);
        self.last = now;
        delta
    }
}

impl<C, I> StateChart<C, I>
where
    C: Send + 'static,
    I: 'static,
{
    /// Run `frames` frames, awaiting `clock` before each call to
    /// [`StateChart::process`].
    pub async fn run_frames<K>(&mut self, clock: &mut K, frames: usize)
    where
        K: FrameClock + ?Sized,
    {
        for _ in 0..frames {
            let delta = clock.tick().await;
            self.process_duration(delta);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{StateChartBuilder, StateDef, TransitionDef};

    fn create_test_chart() -> StateChart<()> {
        StateChartBuilder::new(())
            .states([
                StateDef::compound("Root").initial("Closing"),
                StateDef::atomic("Closing").parent("Root"),
                StateDef::atomic("Closed").parent("Root"),
            ])
            .transition(TransitionDef::new("Closing").to("Closed").delay(0.25))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_fixed_clock_drives_delays() {
        let mut chart = create_test_chart();
        chart.init().unwrap();
        let mut clock = FixedClock::new(Duration::from_millis(100));

        chart.run_frames(&mut clock, 2).await;
        assert!(chart.is_state_active("Closing"));

        chart.run_frames(&mut clock, 1).await;
        assert!(chart.is_state_active("Closed"));
    }

    #[cfg(feature = "tokio-integration")]
    #[tokio::test(start_paused = true)]
    async fn test_interval_clock_measures_elapsed_time() {
        let mut clock = IntervalClock::new(Duration::from_millis(100));
        assert_eq!(clock.tick().await, Duration::from_millis(100));

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(clock.tick().await, Duration::from_millis(250));

        let mut chart = create_test_chart();
        chart.init().unwrap();
        let clock: &mut dyn FrameClock = &mut clock;
        chart.run_frames(clock, 3).await;
        assert!(chart.is_state_active("Closed"));
    }
}
