//! # Slackwater
//!
//! > *Slack water: the still moment between tides, before the water moves again.*
//!
//! Composable retries for async operations.
//!
//! ## Philosophy
//!
//! **Slackwater** keeps the pure parts pure:
//! - **Backoff policies** are plain functions from attempt number to delay
//!   ([`Backoff`])
//! - **Decisions** are plain functions from error to verdict
//!   ([`RetryDecision`])
//! - **Time and cancellation** are injected ([`Clock`], a
//!   [`CancellationToken`](tokio_util::sync::CancellationToken)), so the
//!   loop runs the same against a real timer or a virtual one
//!
//! ## Quick Example
//!
//! ```rust
//! use slackwater::{retry, Backoff, RetryDecision, RetryError};
//! use std::time::Duration;
//!
//! #[derive(Debug, PartialEq)]
//! enum FetchError {
//!     Timeout,
//!     NotFound,
//! }
//!
//! # tokio_test::block_on(async {
//! let backoff = Backoff::exponential(Duration::from_millis(1), 2.0)
//!     .with_max_delay(Duration::from_millis(50));
//!
//! let result = retry(
//!     4,
//!     || async { Err::<String, _>(FetchError::NotFound) },
//!     |err| match err {
//!         FetchError::Timeout => RetryDecision::backoff(backoff.clone()),
//!         FetchError::NotFound => RetryDecision::Stop,
//!     },
//! )
//! .await;
//!
//! assert_eq!(result, Err(RetryError::Operation(FetchError::NotFound)));
//! # });
//! ```
//!
//! ## Features
//!
//! - `async` (default): [`TokioClock`], [`retry`], [`retry_if`] and
//!   `Retrier::new`
//! - `jitter` (default): [`Backoff::with_full_jitter`] and friends
//! - `tracing`: debug events from the retry loop
//! - `serde`: (de)serialisation of [`RetryConfig`]
//! - `proptest`: strategies in [`testing`]

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod backoff;
pub mod clock;
pub mod retry;
pub mod testing;

// Re-exports
pub use backoff::Backoff;
#[cfg(feature = "async")]
pub use clock::TokioClock;
pub use clock::{Clock, ClockError, ClockInstant};
#[cfg(feature = "async")]
pub use retry::{retry, retry_if};
pub use retry::{retry_with_clock, Retrier, RetryConfig, RetryDecision, RetryError};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::backoff::Backoff;
    #[cfg(feature = "async")]
    pub use crate::clock::TokioClock;
    pub use crate::clock::{Clock, ClockError, ClockInstant};
    #[cfg(feature = "async")]
    pub use crate::retry::{retry, retry_if};
    pub use crate::retry::{retry_with_clock, Retrier, RetryConfig, RetryDecision, RetryError};
    pub use tokio_util::sync::CancellationToken;
}
