//! The retry loop and its front ends.

use std::future::Future;
use std::time::Duration;

use futures::future::{self, Either};
use tokio_util::sync::CancellationToken;

use crate::backoff::Backoff;
#[cfg(feature = "async")]
use crate::clock::TokioClock;
use crate::clock::{Clock, ClockError, ClockInstant};
use crate::retry::{RetryConfig, RetryDecision, RetryError};

/// Run `operation` up to `max_attempts` times on the given clock.
///
/// After each failed attempt except the last, `decide` sees the error and
/// either picks a backoff policy or stops the loop. The final attempt never
/// consults `decide`; its result is returned as-is.
///
/// Cancellation through `cancel` is checked before every attempt, after
/// every failed attempt (before `decide` runs) and for the whole of every
/// sleep. Once observed it ends the loop with [`RetryError::Cancelled`],
/// whatever `decide` would have said. An attempt that has already started
/// still reports its own result: a success wins, and the final attempt's
/// error is returned as-is even if cancellation arrived while it ran.
///
/// `tolerance` is handed to [`Clock::sleep_until`] unchanged.
///
/// # Panics
///
/// Panics if `max_attempts` is zero.
///
/// # Example
///
/// ```rust
/// use slackwater::testing::ManualClock;
/// use slackwater::{retry_with_clock, Backoff, RetryDecision};
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
///
/// # tokio_test::block_on(async {
/// let clock = ManualClock::new();
/// let calls = AtomicU32::new(0);
///
/// let result = retry_with_clock(
///     3,
///     None,
///     &clock,
///     &CancellationToken::new(),
///     || async {
///         let n = calls.fetch_add(1, Ordering::SeqCst);
///         if n < 2 { Err("not yet") } else { Ok(n) }
///     },
///     |_| RetryDecision::backoff(Backoff::constant(Duration::from_secs(1))),
/// )
/// .await;
///
/// assert_eq!(result, Ok(2));
/// assert_eq!(clock.sleeps(), vec![Duration::from_secs(1); 2]);
/// # });
/// ```
pub async fn retry_with_clock<C, T, E, F, Fut, D>(
    max_attempts: u32,
    tolerance: Option<Duration>,
    clock: &C,
    cancel: &CancellationToken,
    mut operation: F,
    mut decide: D,
) -> Result<T, RetryError<E>>
where
    C: Clock,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    D: FnMut(&E) -> RetryDecision,
{
    assert!(max_attempts >= 1, "Retry must have at least one attempt");

    for attempt in 0..max_attempts - 1 {
        if cancel.is_cancelled() {
            return Err(cancelled(attempt));
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(attempt, "starting attempt");

        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        if cancel.is_cancelled() {
            return Err(cancelled(attempt));
        }

        match decide(&error) {
            RetryDecision::Backoff(policy) => {
                let delay = policy.delay_for_attempt(attempt);

                #[cfg(feature = "tracing")]
                tracing::debug!(attempt, ?delay, "attempt failed, backing off");

                if let Err(err) = sleep_or_cancel(clock, delay, tolerance, cancel).await {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(attempt, error = %err, "backoff interrupted");
                    return Err(err.into());
                }
            }
            RetryDecision::Stop => {
                #[cfg(feature = "tracing")]
                tracing::debug!(attempt, "retry stopped by decision");

                return Err(RetryError::Operation(error));
            }
        }
    }

    let last = max_attempts - 1;
    if cancel.is_cancelled() {
        return Err(cancelled(last));
    }

    #[cfg(feature = "tracing")]
    tracing::trace!(attempt = last, "starting final attempt");

    operation().await.map_err(RetryError::Operation)
}

/// Retry on the default [`TokioClock`] with no tolerance and no external
/// cancellation.
///
/// # Panics
///
/// Panics if `max_attempts` is zero.
///
/// # Example
///
/// ```rust
/// use slackwater::{retry, Backoff, RetryDecision};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let result = retry(
///     3,
///     || async { Ok::<_, String>(42) },
///     |_| RetryDecision::backoff(Backoff::constant(Duration::from_millis(10))),
/// )
/// .await;
///
/// assert_eq!(result, Ok(42));
/// # });
/// ```
#[cfg(feature = "async")]
pub async fn retry<T, E, F, Fut, D>(
    max_attempts: u32,
    operation: F,
    decide: D,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    D: FnMut(&E) -> RetryDecision,
{
    retry_with_clock(
        max_attempts,
        None,
        &TokioClock::new(),
        &CancellationToken::new(),
        operation,
        decide,
    )
    .await
}

/// Retry only when the predicate returns true for the error, always waiting
/// according to the same `backoff`.
///
/// Non-retryable errors immediately propagate without further attempts.
///
/// # Example
///
/// ```rust
/// use slackwater::{retry_if, Backoff, RetryError};
/// use std::time::Duration;
///
/// #[derive(Debug, PartialEq, Clone)]
/// enum AppError { Transient, Permanent }
///
/// # tokio_test::block_on(async {
/// let result = retry_if(
///     3,
///     Backoff::constant(Duration::from_millis(10)),
///     || async { Err::<(), _>(AppError::Permanent) },
///     |err| matches!(err, AppError::Transient),
/// )
/// .await;
///
/// assert_eq!(result, Err(RetryError::Operation(AppError::Permanent)));
/// # });
/// ```
#[cfg(feature = "async")]
pub async fn retry_if<T, E, F, Fut, P>(
    max_attempts: u32,
    backoff: Backoff,
    operation: F,
    should_retry: P,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: FnMut(&E) -> bool,
{
    let decide = predicate_decision(backoff, should_retry);
    retry(max_attempts, operation, decide).await
}

/// Reusable retry settings bound to a clock and a cancellation token.
///
/// # Example
///
/// ```rust
/// use slackwater::{Backoff, Retrier};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let retrier = Retrier::new(4).with_tolerance(Duration::from_millis(5));
///
/// let result = retrier
///     .run_if(
///         || async { Ok::<_, String>("done") },
///         Backoff::exponential(Duration::from_millis(10), 2.0),
///         |_| true,
///     )
///     .await;
///
/// assert_eq!(result, Ok("done"));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct Retrier<C> {
    config: RetryConfig,
    clock: C,
    cancel: CancellationToken,
}

#[cfg(feature = "async")]
impl Retrier<TokioClock> {
    /// A retrier on the default [`TokioClock`].
    ///
    /// # Panics
    ///
    /// Panics if `max_attempts` is zero.
    pub fn new(max_attempts: u32) -> Self {
        Self::with_clock(max_attempts, TokioClock::new())
    }
}

impl<C: Clock> Retrier<C> {
    /// A retrier on a specific clock.
    ///
    /// # Panics
    ///
    /// Panics if `max_attempts` is zero.
    pub fn with_clock(max_attempts: u32, clock: C) -> Self {
        Self::from_config(RetryConfig::new(max_attempts), clock)
    }

    /// A retrier from an existing configuration.
    ///
    /// # Panics
    ///
    /// Panics if the configuration allows zero attempts.
    pub fn from_config(config: RetryConfig, clock: C) -> Self {
        assert!(
            config.validate().is_ok(),
            "Retry must have at least one attempt"
        );
        Self {
            config,
            clock,
            cancel: CancellationToken::new(),
        }
    }

    /// Allow each backoff sleep to wake up to `tolerance` late.
    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.config = self.config.with_tolerance(tolerance);
        self
    }

    /// Observe `token` for cancellation.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The token this retrier observes. Operations can clone it to stop
    /// early on their own.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Get the configuration.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Get the clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Retry `operation`, asking `decide` what to do after each failure.
    pub async fn run<T, E, F, Fut, D>(&self, operation: F, decide: D) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        D: FnMut(&E) -> RetryDecision,
    {
        retry_with_clock(
            self.config.max_attempts(),
            self.config.tolerance(),
            &self.clock,
            &self.cancel,
            operation,
            decide,
        )
        .await
    }

    /// Retry `operation` with a fixed `backoff` while `should_retry` holds.
    pub async fn run_if<T, E, F, Fut, P>(
        &self,
        operation: F,
        backoff: Backoff,
        should_retry: P,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: FnMut(&E) -> bool,
    {
        self.run(operation, predicate_decision(backoff, should_retry)).await
    }
}

/// Adapt a predicate and a fixed policy into a decision function.
fn predicate_decision<E, P>(
    backoff: Backoff,
    mut should_retry: P,
) -> impl FnMut(&E) -> RetryDecision
where
    P: FnMut(&E) -> bool,
{
    move |error| {
        if should_retry(error) {
            RetryDecision::Backoff(backoff.clone())
        } else {
            RetryDecision::Stop
        }
    }
}

/// Sleep for `delay`, giving up as soon as `cancel` fires.
async fn sleep_or_cancel<C: Clock>(
    clock: &C,
    delay: Duration,
    tolerance: Option<Duration>,
    cancel: &CancellationToken,
) -> Result<(), ClockError> {
    let deadline = clock.now().advanced_by(delay);
    let cancelled = cancel.cancelled();
    let sleep = clock.sleep_until(deadline, tolerance);
    futures::pin_mut!(cancelled, sleep);

    // `select` polls its first argument first, so a cancellation that is
    // already pending beats a sleep that is already due.
    match future::select(cancelled, sleep).await {
        Either::Left(((), _)) => Err(ClockError::Cancelled),
        Either::Right((result, _)) => result,
    }
}

#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn cancelled<E>(attempt: u32) -> RetryError<E> {
    #[cfg(feature = "tracing")]
    tracing::debug!(attempt, "retry cancelled");
    RetryError::Cancelled
}
