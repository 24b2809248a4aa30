//! The default clock, backed by tokio's timer.

use std::time::Duration;

use tokio::time::Instant;

use super::{Clock, ClockError, ClockInstant, FAR_FUTURE};

/// Monotonic clock using [`tokio::time`].
///
/// Instants come from [`tokio::time::Instant`], so paused-time tests
/// (`#[tokio::test(start_paused = true)]`) drive it without real waiting.
/// tokio's timer has no notion of tolerance, so it is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl TokioClock {
    /// Create the clock.
    pub fn new() -> Self {
        Self
    }
}

impl ClockInstant for Instant {
    fn advanced_by(self, duration: Duration) -> Self {
        self.checked_add(duration)
            .or_else(|| self.checked_add(FAR_FUTURE))
            .unwrap_or(self)
    }

    fn duration_to(self, later: Self) -> Duration {
        later.saturating_duration_since(self)
    }
}

impl Clock for TokioClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn minimum_resolution(&self) -> Duration {
        Duration::from_nanos(1)
    }

    async fn sleep_until(
        &self,
        deadline: Instant,
        _tolerance: Option<Duration>,
    ) -> Result<(), ClockError> {
        tokio::time::sleep_until(deadline).await;
        Ok(())
    }
}
