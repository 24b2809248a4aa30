//! Property-based tests for backoff policies

use proptest::prelude::*;
use slackwater::Backoff;
use std::time::Duration;

fn millis() -> impl Strategy<Value = Duration> {
    (0u64..86_400_000).prop_map(Duration::from_millis)
}

fn base_policy() -> impl Strategy<Value = Backoff> {
    prop_oneof![
        Just(Backoff::none()),
        millis().prop_map(Backoff::constant),
        (millis(), millis()).prop_map(|(step, base)| Backoff::linear(step, base)),
        (millis(), 0.5f64..3.0).prop_map(|(base, factor)| Backoff::exponential(base, factor)),
    ]
}

proptest! {
    #[test]
    fn prop_none_is_zero(attempt in any::<u32>()) {
        prop_assert_eq!(Backoff::none().delay_for_attempt(attempt), Duration::ZERO);
    }

    #[test]
    fn prop_constant_is_constant(delay in millis(), attempt in any::<u32>()) {
        prop_assert_eq!(Backoff::constant(delay).delay_for_attempt(attempt), delay);
    }

    #[test]
    fn prop_linear_formula(step in millis(), base in millis(), attempt in 0u32..10_000) {
        let expected = step * attempt + base;
        prop_assert_eq!(Backoff::linear(step, base).delay_for_attempt(attempt), expected);
    }

    #[test]
    fn prop_exponential_integer_factor(
        base_secs in 0u64..1_000_000_000,
        base_nanos in 0u32..1_000_000_000,
        factor in 1u32..4,
        attempt in 0u32..8
    ) {
        let base = Duration::new(base_secs, base_nanos);
        let expected = base.checked_mul(factor.pow(attempt)).unwrap_or(Duration::MAX);
        let policy = Backoff::exponential(base, f64::from(factor));
        prop_assert_eq!(policy.delay_for_attempt(attempt), expected);
    }

    #[test]
    fn prop_max_delay_is_upper_bound(
        policy in base_policy(),
        limit in millis(),
        attempt in 0u32..64
    ) {
        prop_assert!(policy.with_max_delay(limit).delay_for_attempt(attempt) <= limit);
    }

    #[test]
    fn prop_min_delay_is_lower_bound(
        policy in base_policy(),
        floor in millis(),
        attempt in 0u32..64
    ) {
        prop_assert!(policy.with_min_delay(floor).delay_for_attempt(attempt) >= floor);
    }

    #[test]
    fn prop_max_leaves_smaller_delays_alone(
        policy in base_policy(),
        attempt in 0u32..64
    ) {
        let raw = policy.delay_for_attempt(attempt);
        prop_assert_eq!(policy.with_max_delay(Duration::MAX).delay_for_attempt(attempt), raw);
    }
}

#[cfg(feature = "jitter")]
proptest! {
    #[test]
    fn prop_jitter_stays_below_base(
        delay in millis(),
        seed in any::<u64>(),
        attempt in 0u32..64
    ) {
        let jittered = Backoff::constant(delay).with_full_jitter_seeded(seed);
        let sample = jittered.delay_for_attempt(attempt);
        if delay.is_zero() {
            prop_assert_eq!(sample, Duration::ZERO);
        } else {
            prop_assert!(sample < delay);
        }
    }

    #[test]
    fn prop_jitter_is_reproducible_with_seed(seed in any::<u64>()) {
        let a = Backoff::exponential(Duration::from_millis(100), 2.0).with_full_jitter_seeded(seed);
        let b = Backoff::exponential(Duration::from_millis(100), 2.0).with_full_jitter_seeded(seed);
        for attempt in 0..10 {
            prop_assert_eq!(a.delay_for_attempt(attempt), b.delay_for_attempt(attempt));
        }
    }
}

#[test]
fn exponential_scenario_with_cap_and_floor() {
    let secs = Duration::from_secs;
    let exponential = Backoff::exponential(secs(3), 2.0);
    let capped = exponential.clone().with_max_delay(secs(10));
    let floored = exponential.clone().with_min_delay(secs(7));

    let run = |p: &Backoff| (0..4).map(|a| p.delay_for_attempt(a)).collect::<Vec<_>>();

    assert_eq!(
        run(&exponential),
        vec![secs(3), secs(6), secs(12), secs(24)]
    );
    assert_eq!(run(&capped), vec![secs(3), secs(6), secs(10), secs(10)]);
    assert_eq!(run(&floored), vec![secs(7), secs(7), secs(12), secs(24)]);
}
