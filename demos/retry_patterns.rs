//! Retry Patterns Example
//!
//! Demonstrates slackwater's retry building blocks:
//! - Backoff policies and their modifiers
//! - Deciding per error (including server-provided hints)
//! - Predicate-based retry with a fixed policy
//! - Cancelling a retry from another task

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use slackwater::prelude::*;

// ==================== Backoff Policies ====================

/// Example 1: Comparing backoff policies
///
/// Prints the first few delays of each policy.
fn example_backoff_policies() {
    println!("\n=== Example 1: Backoff Policies ===");

    let policies = [
        (
            "constant 100ms",
            Backoff::constant(Duration::from_millis(100)),
        ),
        (
            "linear 100ms/step from 50ms",
            Backoff::linear(Duration::from_millis(100), Duration::from_millis(50)),
        ),
        (
            "exponential 3s x2, capped at 10s",
            Backoff::exponential(Duration::from_secs(3), 2.0)
                .with_max_delay(Duration::from_secs(10)),
        ),
        (
            "exponential 100ms x2, full jitter",
            Backoff::exponential(Duration::from_millis(100), 2.0).with_full_jitter_seeded(42),
        ),
    ];

    for (name, policy) in &policies {
        let delays: Vec<_> = (0..5).map(|a| policy.delay_for_attempt(a)).collect();
        println!("  {:<36} {:?}", name, delays);
    }
}

// ==================== Per-Error Decisions ====================

#[derive(Debug)]
enum ApiError {
    RateLimited { retry_after: Duration },
    Unavailable,
    BadRequest,
}

/// Example 2: Choosing the backoff from the error
async fn example_per_error_decision() {
    println!("\n=== Example 2: Per-Error Decisions ===");

    let attempts = Arc::new(AtomicU32::new(0));

    let result = retry(
        5,
        {
            let attempts = attempts.clone();
            move || {
                let attempts = attempts.clone();
                async move {
                    let n = attempts.fetch_add(1, Ordering::SeqCst);
                    println!("  Attempt {}", n + 1);
                    match n {
                        0 => Err(ApiError::RateLimited {
                            retry_after: Duration::from_millis(20),
                        }),
                        1 => Err(ApiError::Unavailable),
                        _ => Ok("payload"),
                    }
                }
            }
        },
        |err| match err {
            ApiError::RateLimited { retry_after } => {
                RetryDecision::backoff(Backoff::constant(*retry_after))
            }
            ApiError::Unavailable => {
                RetryDecision::backoff(Backoff::exponential(Duration::from_millis(10), 2.0))
            }
            ApiError::BadRequest => RetryDecision::Stop,
        },
    )
    .await;

    println!("  Result: {:?}", result);
}

// ==================== Predicate Retry ====================

/// Example 3: Retrying only transient errors with a fixed policy
async fn example_retry_if() {
    println!("\n=== Example 3: Predicate Retry ===");

    let result = retry_if(
        5,
        Backoff::constant(Duration::from_millis(5)),
        || async { Err::<(), _>(ApiError::BadRequest) },
        |err| !matches!(err, ApiError::BadRequest),
    )
    .await;

    println!("  Bad requests are not retried: {:?}", result);
}

// ==================== Cancellation ====================

/// Example 4: Cancelling a long backoff from another task
async fn example_cancellation() {
    println!("\n=== Example 4: Cancellation ===");

    let token = CancellationToken::new();
    let retrier = Retrier::new(10).with_cancellation(token.clone());

    let handle = tokio::spawn(async move {
        retrier
            .run(
                || async { Err::<(), _>("still down") },
                |_| RetryDecision::backoff(Backoff::constant(Duration::from_secs(30))),
            )
            .await
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    token.cancel();

    match handle.await {
        Ok(Err(RetryError::Cancelled)) => println!("  Retry cancelled during backoff"),
        other => println!("  Unexpected outcome: {:?}", other),
    }
}

#[tokio::main]
async fn main() {
    #[cfg(feature = "tracing")]
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("Slackwater Retry Patterns");
    println!("=========================");

    example_backoff_policies();
    example_per_error_decision().await;
    example_retry_if().await;
    example_cancellation().await;
}
