//! Backoff policies: how long to wait before the next attempt.
//!
//! A [`Backoff`] is a pure function from a 0-based attempt index to a
//! [`Duration`]. Policies are built from a handful of factories and then
//! shaped with modifiers:
//!
//! - **Factories**: [`none`](Backoff::none), [`constant`](Backoff::constant),
//!   [`linear`](Backoff::linear), [`exponential`](Backoff::exponential),
//!   [`from_fn`](Backoff::from_fn)
//! - **Modifiers**: [`with_max_delay`](Backoff::with_max_delay),
//!   [`with_min_delay`](Backoff::with_min_delay) and (with the `jitter`
//!   feature) [`with_full_jitter`](Backoff::with_full_jitter)
//!
//! Modifiers wrap the policy they are called on, so they apply in the order
//! they are written. Capping and then flooring is not the same as flooring
//! and then capping when the floor is above the cap:
//!
//! ```rust
//! use slackwater::Backoff;
//! use std::time::Duration;
//!
//! let secs = Duration::from_secs;
//!
//! let capped_then_floored = Backoff::constant(secs(20))
//!     .with_max_delay(secs(5))
//!     .with_min_delay(secs(8));
//! let floored_then_capped = Backoff::constant(secs(20))
//!     .with_min_delay(secs(8))
//!     .with_max_delay(secs(5));
//!
//! assert_eq!(capped_then_floored.delay_for_attempt(0), secs(8));
//! assert_eq!(floored_then_capped.delay_for_attempt(0), secs(5));
//! ```

#[cfg(feature = "jitter")]
mod jitter;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "jitter")]
use jitter::JitterSource;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// A backoff policy mapping an attempt index to a delay.
///
/// Policies are immutable once built. Cloning is cheap (an `Arc` bump) and
/// clones share everything, including the generator of a jittered policy.
///
/// Evaluation never fails: arithmetic that would overflow saturates at
/// [`Duration::MAX`].
///
/// # Examples
///
/// ```rust
/// use slackwater::Backoff;
/// use std::time::Duration;
///
/// let policy = Backoff::exponential(Duration::from_secs(3), 2.0)
///     .with_max_delay(Duration::from_secs(10));
///
/// assert_eq!(policy.delay_for_attempt(0), Duration::from_secs(3));
/// assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(6));
/// assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(10));
/// ```
#[derive(Clone)]
pub struct Backoff {
    kind: Arc<Kind>,
}

enum Kind {
    None,
    Constant(Duration),
    Linear {
        step: Duration,
        base: Duration,
    },
    Exponential {
        base: Duration,
        factor: f64,
    },
    Custom(Box<dyn Fn(u32) -> Duration + Send + Sync>),
    Max {
        inner: Backoff,
        limit: Duration,
    },
    Min {
        inner: Backoff,
        floor: Duration,
    },
    #[cfg(feature = "jitter")]
    Jitter {
        inner: Backoff,
        source: JitterSource,
    },
}

impl Backoff {
    fn from_kind(kind: Kind) -> Self {
        Self {
            kind: Arc::new(kind),
        }
    }

    /// Retry immediately: every delay is zero.
    ///
    /// ```rust
    /// use slackwater::Backoff;
    /// use std::time::Duration;
    ///
    /// assert_eq!(Backoff::none().delay_for_attempt(7), Duration::ZERO);
    /// ```
    pub fn none() -> Self {
        Self::from_kind(Kind::None)
    }

    /// Wait the same `delay` before every retry.
    ///
    /// ```rust
    /// use slackwater::Backoff;
    /// use std::time::Duration;
    ///
    /// let policy = Backoff::constant(Duration::from_millis(500));
    ///
    /// assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(500));
    /// assert_eq!(policy.delay_for_attempt(9), Duration::from_millis(500));
    /// ```
    pub fn constant(delay: Duration) -> Self {
        Self::from_kind(Kind::Constant(delay))
    }

    /// Grow the delay by `step` per attempt, starting from `base`.
    ///
    /// Delay = step * attempt + base
    ///
    /// ```rust
    /// use slackwater::Backoff;
    /// use std::time::Duration;
    ///
    /// let policy = Backoff::linear(Duration::from_millis(100), Duration::from_millis(50));
    ///
    /// assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(50));
    /// assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(150));
    /// assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(250));
    /// ```
    pub fn linear(step: Duration, base: Duration) -> Self {
        Self::from_kind(Kind::Linear { step, base })
    }

    /// Multiply the delay by `factor` per attempt, starting from `base`.
    ///
    /// Delay = base * factor^attempt
    ///
    /// `factor` may be fractional (`1.5` grows more gently than `2.0`). It is
    /// expected to be finite and non-negative; results that come out negative
    /// or NaN are treated as zero. Whole factors are exact to the nanosecond
    /// for any base; fractional ones are rounded through `f64`.
    ///
    /// ```rust
    /// use slackwater::Backoff;
    /// use std::time::Duration;
    ///
    /// let policy = Backoff::exponential(Duration::from_millis(100), 2.0);
    ///
    /// assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
    /// assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
    /// assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(400));
    /// ```
    pub fn exponential(base: Duration, factor: f64) -> Self {
        Self::from_kind(Kind::Exponential { base, factor })
    }

    /// Build a policy from an arbitrary attempt-indexed function.
    ///
    /// The function should be pure: the retry loop may evaluate it from any
    /// task, and clones of the policy share it.
    ///
    /// ```rust
    /// use slackwater::Backoff;
    /// use std::time::Duration;
    ///
    /// let fixed_schedule = [1, 1, 5, 30];
    /// let policy = Backoff::from_fn(move |attempt| {
    ///     let idx = (attempt as usize).min(fixed_schedule.len() - 1);
    ///     Duration::from_secs(fixed_schedule[idx])
    /// });
    ///
    /// assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(5));
    /// assert_eq!(policy.delay_for_attempt(40), Duration::from_secs(30));
    /// ```
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(u32) -> Duration + Send + Sync + 'static,
    {
        Self::from_kind(Kind::Custom(Box::new(f)))
    }

    /// Cap every delay at `limit`.
    ///
    /// ```rust
    /// use slackwater::Backoff;
    /// use std::time::Duration;
    ///
    /// let policy = Backoff::exponential(Duration::from_secs(3), 2.0)
    ///     .with_max_delay(Duration::from_secs(10));
    ///
    /// assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(10));
    /// ```
    pub fn with_max_delay(self, limit: Duration) -> Self {
        Self::from_kind(Kind::Max { inner: self, limit })
    }

    /// Raise every delay to at least `floor`.
    ///
    /// ```rust
    /// use slackwater::Backoff;
    /// use std::time::Duration;
    ///
    /// let policy = Backoff::exponential(Duration::from_secs(3), 2.0)
    ///     .with_min_delay(Duration::from_secs(7));
    ///
    /// assert_eq!(policy.delay_for_attempt(0), Duration::from_secs(7));
    /// assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(12));
    /// ```
    pub fn with_min_delay(self, floor: Duration) -> Self {
        Self::from_kind(Kind::Min { inner: self, floor })
    }

    /// Replace each delay `d` with a uniformly random delay in `[0, d)`.
    ///
    /// Uses a small, fast generator seeded from the operating system. A zero
    /// delay stays zero.
    ///
    /// ```rust
    /// use slackwater::Backoff;
    /// use std::time::Duration;
    ///
    /// let policy = Backoff::constant(Duration::from_secs(1)).with_full_jitter();
    ///
    /// assert!(policy.delay_for_attempt(0) < Duration::from_secs(1));
    /// ```
    #[cfg(feature = "jitter")]
    pub fn with_full_jitter(self) -> Self {
        Self::from_kind(Kind::Jitter {
            inner: self,
            source: JitterSource::from_os(),
        })
    }

    /// Full jitter driven by the default generator seeded with `seed`.
    ///
    /// Two policies built with the same seed produce the same sequence of
    /// delays, which keeps tests reproducible.
    ///
    /// ```rust
    /// use slackwater::Backoff;
    /// use std::time::Duration;
    ///
    /// let a = Backoff::constant(Duration::from_secs(1)).with_full_jitter_seeded(7);
    /// let b = Backoff::constant(Duration::from_secs(1)).with_full_jitter_seeded(7);
    ///
    /// assert_eq!(a.delay_for_attempt(0), b.delay_for_attempt(0));
    /// ```
    #[cfg(feature = "jitter")]
    pub fn with_full_jitter_seeded(self, seed: u64) -> Self {
        Self::from_kind(Kind::Jitter {
            inner: self,
            source: JitterSource::seeded(seed),
        })
    }

    /// Full jitter driven by a caller-supplied generator.
    #[cfg(feature = "jitter")]
    pub fn with_full_jitter_rng<R>(self, rng: R) -> Self
    where
        R: rand::RngCore + Send + 'static,
    {
        Self::from_kind(Kind::Jitter {
            inner: self,
            source: JitterSource::new(rng),
        })
    }

    /// Calculate the delay before the retry that follows attempt N (0-indexed).
    ///
    /// The first failed attempt is attempt 0.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match &*self.kind {
            Kind::None => Duration::ZERO,
            Kind::Constant(d) => *d,
            Kind::Linear { step, base } => step.saturating_mul(attempt).saturating_add(*base),
            Kind::Exponential { base, factor } => exponential_delay(*base, *factor, attempt),
            Kind::Custom(f) => f(attempt),
            Kind::Max { inner, limit } => inner.delay_for_attempt(attempt).min(*limit),
            Kind::Min { inner, floor } => inner.delay_for_attempt(attempt).max(*floor),
            #[cfg(feature = "jitter")]
            Kind::Jitter { inner, source } => source.sample_below(inner.delay_for_attempt(attempt)),
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for Backoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.kind {
            Kind::None => f.write_str("None"),
            Kind::Constant(d) => f.debug_tuple("Constant").field(d).finish(),
            Kind::Linear { step, base } => f
                .debug_struct("Linear")
                .field("step", step)
                .field("base", base)
                .finish(),
            Kind::Exponential { base, factor } => f
                .debug_struct("Exponential")
                .field("base", base)
                .field("factor", factor)
                .finish(),
            Kind::Custom(_) => f.write_str("Custom(..)"),
            Kind::Max { inner, limit } => f
                .debug_struct("Max")
                .field("inner", inner)
                .field("limit", limit)
                .finish(),
            Kind::Min { inner, floor } => f
                .debug_struct("Min")
                .field("inner", inner)
                .field("floor", floor)
                .finish(),
            #[cfg(feature = "jitter")]
            Kind::Jitter { inner, .. } => f.debug_struct("Jitter").field("inner", inner).finish(),
        }
    }
}

/// base * factor^attempt. Whole factors are computed exactly in integer
/// nanoseconds; anything else goes through `f64`.
fn exponential_delay(base: Duration, factor: f64, attempt: u32) -> Duration {
    if factor >= 0.0 && factor.fract() == 0.0 && factor <= f64::from(u32::MAX) {
        let nanos = base.as_nanos();
        let power = (factor as u128).checked_pow(attempt);
        return match power.and_then(|power| nanos.checked_mul(power)) {
            Some(product) => duration_from_nanos(product),
            None if nanos == 0 => Duration::ZERO,
            None => Duration::MAX,
        };
    }
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    scale(base, factor.powi(exponent))
}

/// Multiply a duration by a real factor, rounding to the nearest nanosecond.
fn scale(base: Duration, factor: f64) -> Duration {
    let nanos = base.as_nanos() as f64 * factor;
    if nanos.is_nan() || nanos <= 0.0 {
        return Duration::ZERO;
    }
    // `as` saturates, so infinities land on u128::MAX.
    duration_from_nanos(nanos.round() as u128)
}

/// Rebuild a duration from a nanosecond count, saturating at `Duration::MAX`.
pub(crate) fn duration_from_nanos(nanos: u128) -> Duration {
    let secs = nanos / NANOS_PER_SEC;
    let subsec = (nanos % NANOS_PER_SEC) as u32;
    match u64::try_from(secs) {
        Ok(secs) => Duration::new(secs, subsec),
        Err(_) => Duration::MAX,
    }
}
