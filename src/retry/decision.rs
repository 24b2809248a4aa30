//! What to do after a failed attempt.

use crate::backoff::Backoff;

/// The verdict a decision function returns for a failed attempt.
///
/// The policy carried by `Backoff` may differ from one failure to the next,
/// which lets the caller pick a delay from the error itself (for example a
/// server-provided retry hint).
///
/// # Examples
///
/// ```rust
/// use slackwater::{Backoff, RetryDecision};
/// use std::time::Duration;
///
/// enum HttpError {
///     TooManyRequests { retry_after: Duration },
///     Unavailable,
///     NotFound,
/// }
///
/// fn decide(err: &HttpError) -> RetryDecision {
///     match err {
///         HttpError::TooManyRequests { retry_after } => {
///             RetryDecision::backoff(Backoff::constant(*retry_after))
///         }
///         HttpError::Unavailable => {
///             RetryDecision::backoff(Backoff::exponential(Duration::from_millis(100), 2.0))
///         }
///         HttpError::NotFound => RetryDecision::Stop,
///     }
/// }
///
/// assert!(decide(&HttpError::NotFound).is_stop());
/// ```
#[derive(Debug, Clone)]
pub enum RetryDecision {
    /// Retry after waiting for the delay this policy gives for the attempt.
    Backoff(Backoff),
    /// Give up and surface the error.
    Stop,
}

impl RetryDecision {
    /// Retry with the given policy.
    pub fn backoff(policy: Backoff) -> Self {
        Self::Backoff(policy)
    }

    /// Returns true if this decision stops the loop.
    pub fn is_stop(&self) -> bool {
        matches!(self, Self::Stop)
    }
}

/// Retry immediately, with no delay.
impl Default for RetryDecision {
    fn default() -> Self {
        Self::Backoff(Backoff::none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_retries_without_delay() {
        match RetryDecision::default() {
            RetryDecision::Backoff(policy) => {
                assert_eq!(policy.delay_for_attempt(0), Duration::ZERO);
            }
            RetryDecision::Stop => panic!("Expected backoff"),
        }
    }

    #[test]
    fn test_is_stop() {
        assert!(RetryDecision::Stop.is_stop());
        assert!(!RetryDecision::backoff(Backoff::none()).is_stop());
    }
}
