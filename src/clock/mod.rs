//! Time sources for the retry loop.
//!
//! The loop never reads the system clock directly. It asks a [`Clock`] for
//! the current instant and for a sleep until a deadline, so tests can swap
//! in [`ManualClock`](crate::testing::ManualClock) and run without waiting.

#[cfg(feature = "async")]
mod tokio_clock;

use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

#[cfg(feature = "async")]
pub use tokio_clock::TokioClock;

/// Roughly thirty years; deadlines that overflow an instant are pushed here.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// A point in time on some [`Clock`].
///
/// Instants are totally ordered and can be moved forward by a [`Duration`].
pub trait ClockInstant: Copy + Ord + Debug + Send + Sync {
    /// The instant `duration` after `self`.
    fn advanced_by(self, duration: Duration) -> Self;

    /// The time from `self` to `later`, or zero if `later` is not after `self`.
    fn duration_to(self, later: Self) -> Duration;
}

/// A source of time that can also suspend until a deadline.
///
/// A single clock may be shared by any number of concurrent retry calls, so
/// implementations must keep per-sleep state local to each call.
pub trait Clock: Send + Sync {
    /// The instant type this clock measures in.
    type Instant: ClockInstant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// The smallest interval this clock can distinguish.
    fn minimum_resolution(&self) -> Duration;

    /// Suspend until `deadline`.
    ///
    /// `tolerance` is how late the wake-up may be; clocks that cannot use it
    /// are free to ignore it.
    fn sleep_until(
        &self,
        deadline: Self::Instant,
        tolerance: Option<Duration>,
    ) -> impl Future<Output = Result<(), ClockError>> + Send;
}

impl ClockInstant for std::time::Instant {
    fn advanced_by(self, duration: Duration) -> Self {
        self.checked_add(duration)
            .or_else(|| self.checked_add(FAR_FUTURE))
            .unwrap_or(self)
    }

    fn duration_to(self, later: Self) -> Duration {
        later.saturating_duration_since(self)
    }
}

/// Error returned by [`Clock::sleep_until`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockError {
    /// The sleep was interrupted by cancellation.
    Cancelled,
    /// The clock could not complete the sleep.
    Failed(String),
}

impl ClockError {
    /// Create a failure with a human-readable reason.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }

    /// Returns true if the sleep was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl std::fmt::Display for ClockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancelled => write!(f, "sleep cancelled"),
            Self::Failed(reason) => write!(f, "clock failed: {}", reason),
        }
    }
}

impl std::error::Error for ClockError {}
