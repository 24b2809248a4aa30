//! Error types for retry operations.

use crate::clock::ClockError;

/// Error returned when a retry loop ends without a successful attempt.
///
/// The operation's own error is carried verbatim in `Operation`, whether the
/// loop stopped because a decision said so or because attempts ran out.
///
/// # Examples
///
/// ```rust
/// use slackwater::{retry, RetryDecision, RetryError};
///
/// # tokio_test::block_on(async {
/// let result = retry(
///     3,
///     || async { Err::<(), _>("always fails") },
///     |_| RetryDecision::default(),
/// )
/// .await;
///
/// match result {
///     Err(RetryError::Operation(e)) => assert_eq!(e, "always fails"),
///     _ => panic!("Expected operation error"),
/// }
/// # });
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    /// The last attempt failed with this error.
    Operation(E),
    /// The retry was cancelled before it could finish.
    Cancelled,
    /// The clock failed while waiting between attempts.
    Clock(ClockError),
}

impl<E> RetryError<E> {
    /// Returns true if the retry was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns true if this carries the operation's error.
    pub fn is_operation(&self) -> bool {
        matches!(self, Self::Operation(_))
    }

    /// Get a reference to the operation's error if present.
    pub fn operation_error(&self) -> Option<&E> {
        match self {
            Self::Operation(e) => Some(e),
            _ => None,
        }
    }

    /// Extract the operation's error if present.
    pub fn into_operation_error(self) -> Option<E> {
        match self {
            Self::Operation(e) => Some(e),
            _ => None,
        }
    }

    /// Transform the operation's error, leaving the other variants alone.
    pub fn map_operation<F, E2>(self, f: F) -> RetryError<E2>
    where
        F: FnOnce(E) -> E2,
    {
        match self {
            Self::Operation(e) => RetryError::Operation(f(e)),
            Self::Cancelled => RetryError::Cancelled,
            Self::Clock(e) => RetryError::Clock(e),
        }
    }
}

impl<E> From<ClockError> for RetryError<E> {
    fn from(err: ClockError) -> Self {
        match err {
            ClockError::Cancelled => Self::Cancelled,
            other => Self::Clock(other),
        }
    }
}

impl<E: std::fmt::Display> std::fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Operation(e) => write!(f, "{}", e),
            Self::Cancelled => write!(f, "retry cancelled"),
            Self::Clock(e) => write!(f, "backoff interrupted: {}", e),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Operation(e) => Some(e),
            Self::Cancelled => None,
            Self::Clock(e) => Some(e),
        }
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;
    use std::error::Error;

    #[derive(Debug)]
    struct Boom;

    impl std::fmt::Display for Boom {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "boom")
        }
    }

    impl std::error::Error for Boom {}

    #[test]
    fn test_operation_error_display_is_verbatim() {
        let err = RetryError::Operation("connection refused");
        assert_eq!(format!("{}", err), "connection refused");
    }

    #[test]
    fn test_cancelled_display() {
        let err: RetryError<String> = RetryError::Cancelled;
        assert_eq!(format!("{}", err), "retry cancelled");
        assert!(err.is_cancelled());
        assert!(!err.is_operation());
        assert!(err.into_operation_error().is_none());
    }

    #[test]
    fn test_clock_error_display() {
        let err: RetryError<String> = RetryError::Clock(ClockError::failed("no timer"));
        assert!(format!("{}", err).contains("no timer"));
    }

    #[test]
    fn test_from_clock_error() {
        let cancelled: RetryError<()> = ClockError::Cancelled.into();
        assert_eq!(cancelled, RetryError::Cancelled);

        let failed: RetryError<()> = ClockError::failed("x").into();
        assert_eq!(failed, RetryError::Clock(ClockError::failed("x")));
    }

    #[test]
    fn test_accessors() {
        let err = RetryError::Operation(5);
        assert!(err.is_operation());
        assert_eq!(err.operation_error(), Some(&5));
        assert_eq!(err.map_operation(|n| n * 2), RetryError::Operation(10));
    }

    #[test]
    fn test_source_points_at_operation_error() {
        let err = RetryError::Operation(Boom);
        assert_eq!(
            err.source().map(|s| s.to_string()),
            Some("boom".to_string())
        );

        let cancelled: RetryError<Boom> = RetryError::Cancelled;
        assert!(cancelled.source().is_none());
    }
}
