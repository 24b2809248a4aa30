//! Random sources for full jitter.

use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};

use super::duration_from_nanos;

/// Generator state captured by a jittered policy.
///
/// The generator is shared by every clone of the policy, so successive
/// evaluations continue a single pseudo-random sequence.
pub(crate) struct JitterSource {
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl JitterSource {
    pub(crate) fn new<R>(rng: R) -> Self
    where
        R: RngCore + Send + 'static,
    {
        Self {
            rng: Mutex::new(Box::new(rng)),
        }
    }

    pub(crate) fn from_os() -> Self {
        Self::new(SmallRng::from_os_rng())
    }

    pub(crate) fn seeded(seed: u64) -> Self {
        Self::new(SmallRng::seed_from_u64(seed))
    }

    /// Draw a duration uniformly from `[0, upper)`.
    ///
    /// The draw spans the full nanosecond range of `upper` as a `u128`, so
    /// long delays keep their sub-second precision. A zero `upper` yields
    /// zero without advancing the generator.
    pub(crate) fn sample_below(&self, upper: Duration) -> Duration {
        let nanos = upper.as_nanos();
        if nanos == 0 {
            return Duration::ZERO;
        }
        let mut guard = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let rng: &mut Box<dyn RngCore + Send> = &mut guard;
        duration_from_nanos(rng.random_range(0..nanos))
    }
}

impl fmt::Debug for JitterSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JitterSource").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Backoff;

    /// Always returns the same word, so draws are predictable.
    struct FixedRng(u64);

    impl RngCore for FixedRng {
        fn next_u32(&mut self) -> u32 {
            self.0 as u32
        }

        fn next_u64(&mut self) -> u64 {
            self.0
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            for (i, byte) in dst.iter_mut().enumerate() {
                *byte = self.0.to_le_bytes()[i % 8];
            }
        }
    }

    #[test]
    fn test_zero_upper_is_zero() {
        let source = JitterSource::seeded(1);
        assert_eq!(source.sample_below(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn test_draws_stay_below_upper() {
        let source = JitterSource::seeded(42);
        let upper = Duration::from_millis(250);
        for _ in 0..1_000 {
            assert!(source.sample_below(upper) < upper);
        }
    }

    #[test]
    fn test_single_nanosecond_upper_is_zero() {
        let source = JitterSource::seeded(3);
        assert_eq!(source.sample_below(Duration::from_nanos(1)), Duration::ZERO);
    }

    #[test]
    fn test_huge_upper_stays_in_range() {
        let source = JitterSource::seeded(9);
        let upper = Duration::MAX;
        for _ in 0..100 {
            assert!(source.sample_below(upper) < upper);
        }
    }

    #[test]
    fn test_seeded_sequences_repeat() {
        let a = Backoff::exponential(Duration::from_millis(10), 2.0).with_full_jitter_seeded(1234);
        let b = Backoff::exponential(Duration::from_millis(10), 2.0).with_full_jitter_seeded(1234);

        let seq_a: Vec<_> = (0..8).map(|n| a.delay_for_attempt(n)).collect();
        let seq_b: Vec<_> = (0..8).map(|n| b.delay_for_attempt(n)).collect();
        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn test_clones_continue_one_sequence() {
        let policy = Backoff::constant(Duration::from_secs(60)).with_full_jitter_seeded(77);
        let oracle = Backoff::constant(Duration::from_secs(60)).with_full_jitter_seeded(77);

        let clone = policy.clone();
        let observed = [policy.delay_for_attempt(0), clone.delay_for_attempt(0)];
        let expected = [oracle.delay_for_attempt(0), oracle.delay_for_attempt(0)];
        assert_eq!(observed, expected);
    }

    #[test]
    fn test_injected_rng_is_used() {
        let policy = Backoff::constant(Duration::from_secs(1)).with_full_jitter_rng(FixedRng(0));
        assert!(policy.delay_for_attempt(0) < Duration::from_secs(1));

        let zero_base = Backoff::none().with_full_jitter_rng(FixedRng(u64::MAX));
        assert_eq!(zero_base.delay_for_attempt(0), Duration::ZERO);
    }

    #[test]
    fn test_jitter_respects_outer_cap() {
        let policy = Backoff::constant(Duration::from_secs(10))
            .with_full_jitter_seeded(5)
            .with_max_delay(Duration::from_secs(1));
        for attempt in 0..100 {
            assert!(policy.delay_for_attempt(attempt) <= Duration::from_secs(1));
        }
    }
}
