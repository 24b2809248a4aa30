//! Retrying fallible async operations.
//!
//! The loop lives in [`retry_with_clock`]. Everything else in this module is
//! a more convenient way to call it:
//!
//! - [`retry`]: decide per error, default clock
//! - [`retry_if`]: a predicate plus one fixed [`Backoff`](crate::Backoff)
//! - [`Retrier`]: reusable settings (attempts, tolerance, clock,
//!   cancellation token)
//!
//! # Quick Start
//!
//! ```rust
//! use slackwater::{retry, Backoff, RetryDecision};
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let attempts = Arc::new(AtomicU32::new(0));
//!
//! let result = retry(
//!     5,
//!     || {
//!         let attempts = attempts.clone();
//!         async move {
//!             if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
//!                 Err("transient failure")
//!             } else {
//!                 Ok("success")
//!             }
//!         }
//!     },
//!     |_| RetryDecision::backoff(Backoff::exponential(Duration::from_millis(1), 2.0)),
//! )
//! .await;
//!
//! assert_eq!(result, Ok("success"));
//! assert_eq!(attempts.load(Ordering::SeqCst), 3);
//! # });
//! ```
//!
//! # Outcomes
//!
//! - the first successful value
//! - [`RetryError::Operation`] with the last error, when a decision says
//!   [`RetryDecision::Stop`] or attempts run out
//! - [`RetryError::Cancelled`] once the cancellation token fires
//! - [`RetryError::Clock`] if the clock fails mid-backoff

mod config;
mod controller;
mod decision;
mod error;

pub use config::RetryConfig;
#[cfg(feature = "async")]
pub use controller::{retry, retry_if};
pub use controller::{retry_with_clock, Retrier};
pub use decision::RetryDecision;
pub use error::RetryError;
