//! Testing utilities for code that retries.
//!
//! [`ManualClock`] is a virtual [`Clock`]: sleeps finish immediately, move
//! virtual time forward to their deadline, and are recorded so tests can
//! assert on the exact backoff schedule.
//!
//! ```rust
//! use slackwater::testing::ManualClock;
//! use slackwater::{Backoff, Retrier, RetryDecision, RetryError};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let clock = ManualClock::new();
//! let retrier = Retrier::with_clock(4, clock.clone());
//!
//! let result = retrier
//!     .run(
//!         || async { Err::<(), _>("down") },
//!         |_| RetryDecision::backoff(Backoff::linear(Duration::from_secs(1), Duration::ZERO)),
//!     )
//!     .await;
//!
//! assert_eq!(result, Err(RetryError::Operation("down")));
//! assert_eq!(
//!     clock.sleeps(),
//!     vec![Duration::ZERO, Duration::from_secs(1), Duration::from_secs(2)]
//! );
//! assert_eq!(clock.elapsed(), Duration::from_secs(3));
//! # });
//! ```
//!
//! With the `proptest` feature, [`arb_backoff`] generates base policies for
//! property tests.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::clock::{Clock, ClockError, ClockInstant};

/// An instant on a [`ManualClock`]: the time since the clock was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ManualInstant(Duration);

impl ManualInstant {
    /// The offset from the clock's origin.
    pub fn since_origin(self) -> Duration {
        self.0
    }
}

impl ClockInstant for ManualInstant {
    fn advanced_by(self, duration: Duration) -> Self {
        ManualInstant(self.0.saturating_add(duration))
    }

    fn duration_to(self, later: Self) -> Duration {
        later.0.saturating_sub(self.0)
    }
}

/// A single recorded call to [`Clock::sleep_until`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedSleep {
    /// How long the sleep asked to wait, measured from the call.
    pub delay: Duration,
    /// The tolerance passed along with it.
    pub tolerance: Option<Duration>,
}

#[derive(Debug, Default)]
struct State {
    now: Duration,
    sleeps: Vec<RecordedSleep>,
    pending_failures: Vec<ClockError>,
}

/// A virtual clock for deterministic tests.
///
/// Clones share the same timeline, so a test can hand one clone to the code
/// under test and inspect another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    state: Arc<Mutex<State>>,
}

impl ManualClock {
    /// Create a clock at its origin.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move virtual time forward without sleeping.
    pub fn advance(&self, by: Duration) {
        let mut state = self.state();
        state.now = state.now.saturating_add(by);
    }

    /// Total virtual time elapsed since creation.
    pub fn elapsed(&self) -> Duration {
        self.state().now
    }

    /// Delays requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state().sleeps.iter().map(|s| s.delay).collect()
    }

    /// Full records of the sleeps requested so far, in order.
    pub fn recorded_sleeps(&self) -> Vec<RecordedSleep> {
        self.state().sleeps.clone()
    }

    /// Make the next sleep fail with `error` instead of completing.
    ///
    /// Queued failures are consumed in the order they were queued.
    pub fn fail_next_sleep(&self, error: ClockError) {
        self.state().pending_failures.push(error);
    }
}

impl Clock for ManualClock {
    type Instant = ManualInstant;

    fn now(&self) -> ManualInstant {
        ManualInstant(self.state().now)
    }

    fn minimum_resolution(&self) -> Duration {
        Duration::from_nanos(1)
    }

    async fn sleep_until(
        &self,
        deadline: ManualInstant,
        tolerance: Option<Duration>,
    ) -> Result<(), ClockError> {
        let mut state = self.state();
        let delay = deadline.0.saturating_sub(state.now);
        state.sleeps.push(RecordedSleep { delay, tolerance });
        if state.pending_failures.is_empty() {
            state.now = state.now.max(deadline.0);
            Ok(())
        } else {
            Err(state.pending_failures.remove(0))
        }
    }
}

#[cfg(feature = "proptest")]
use proptest::prelude::*;

/// Strategy producing unmodified base policies with delays up to one hour.
#[cfg(feature = "proptest")]
pub fn arb_backoff() -> BoxedStrategy<crate::Backoff> {
    use crate::Backoff;

    let millis = || (0u64..3_600_000).prop_map(Duration::from_millis);
    prop_oneof![
        Just(Backoff::none()),
        millis().prop_map(Backoff::constant),
        (millis(), millis()).prop_map(|(step, base)| Backoff::linear(step, base)),
        (millis(), 1.0f64..4.0).prop_map(|(base, factor)| Backoff::exponential(base, factor)),
    ]
    .boxed()
}
