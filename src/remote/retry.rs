//! remote::retry
//!
//! Bounded exponential-backoff retry around a single remote call.
//!
//! # Policy
//!
//! - At most `max_attempts` attempts (default 5), counting the first.
//! - Only transient failures ([`RemoteError::is_transient`]) are retried.
//! - Before attempt `n + 1` the client sleeps
//!   `base_delay * 2^(n - 1) + jitter`, with jitter uniform in `[0, max_jitter]`.
//! - When the last allowed attempt fails transiently the call fails with
//!   [`RemoteError::RetryExhausted`].
//! - Every other failure is returned immediately, without any delay.

use std::future::Future;
use std::time::Duration;

use backon::{BackoffBuilder, Retryable};
use rand::Rng;
use tracing::{debug, warn};

use super::traits::RemoteError;

/// Backoff settings for [`ResilientClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum attempts per call, including the first
    pub max_attempts: u32,
    /// Delay before the first retry; doubles for each further retry
    pub base_delay: Duration,
    /// Upper bound of the uniform random jitter added to each delay
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_jitter: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A policy that never sleeps. Used by tests and dry runs.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
        }
    }

    /// Deterministic part of the delay after failed attempt `attempt` (1-based).
    ///
    /// # Example
    ///
    /// ```
    /// use refgraph::remote::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::default();
    /// assert_eq!(policy.backoff(1), Duration::from_secs(1));
    /// assert_eq!(policy.backoff(2), Duration::from_secs(2));
    /// assert_eq!(policy.backoff(4), Duration::from_secs(8));
    /// ```
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Full delay after failed attempt `attempt`: backoff plus random jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff(attempt) + self.jitter()
    }

    fn jitter(&self) -> Duration {
        let max_ms = u64::try_from(self.max_jitter.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=max_ms))
    }
}

impl BackoffBuilder for RetryPolicy {
    type Backoff = PolicyBackoff;

    fn build(self) -> PolicyBackoff {
        PolicyBackoff {
            policy: self,
            attempt: 1,
        }
    }
}

/// The delays of a [`RetryPolicy`], one per retry.
///
/// Yields `max_attempts - 1` items, so the call is tried at most
/// `max_attempts` times.
#[derive(Debug, Clone)]
pub struct PolicyBackoff {
    policy: RetryPolicy,
    attempt: u32,
}

impl Iterator for PolicyBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.attempt >= self.policy.max_attempts.max(1) {
            return None;
        }
        let delay = self.policy.delay_for(self.attempt);
        self.attempt += 1;
        Some(delay)
    }
}

/// Executes remote calls under a [`RetryPolicy`].
///
/// # Example
///
/// ```
/// use refgraph::remote::{RemoteError, ResilientClient, RetryPolicy};
///
/// # tokio_test::block_on(async {
/// let client = ResilientClient::new(RetryPolicy::immediate(5));
/// let value = client
///     .execute("answer", || async { Ok::<_, RemoteError>(42) })
///     .await
///     .unwrap();
/// assert_eq!(value, 42);
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResilientClient {
    policy: RetryPolicy,
}

impl ResilientClient {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `op`, retrying transient failures with backoff.
    ///
    /// `what` names the call in log events.
    ///
    /// # Errors
    ///
    /// - `RetryExhausted` if every attempt failed transiently
    /// - any non-transient error from `op`, unchanged, on the attempt it occurred
    pub async fn execute<T, F, Fut>(&self, what: &str, op: F) -> Result<T, RemoteError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut retries = 0u32;

        let result = op
            .retry(self.policy)
            .when(RemoteError::is_transient)
            .notify(|err: &RemoteError, delay: Duration| {
                retries += 1;
                warn!(
                    what,
                    attempt = retries,
                    max_attempts,
                    status = err.status().unwrap_or_default(),
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "transient remote failure, retrying"
                );
            })
            .await;

        let attempts = retries + 1;
        match result {
            Ok(value) => {
                if retries > 0 {
                    debug!(what, attempts, "remote call succeeded after retry");
                }
                Ok(value)
            }
            Err(err) if err.is_transient() => {
                let last_status = err.status().unwrap_or_default();
                warn!(what, attempts, last_status, "giving up on remote call");
                Err(RemoteError::RetryExhausted {
                    last_status,
                    attempts,
                })
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn unavailable() -> RemoteError {
        RemoteError::from_status(503, "busy")
    }

    fn no_jitter() -> RetryPolicy {
        RetryPolicy {
            max_jitter: Duration::ZERO,
            ..RetryPolicy::default()
        }
    }

    /// Fails transiently `failures` times, then returns the attempt number.
    async fn flaky(calls: &AtomicU32, failures: u32) -> Result<u32, RemoteError> {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= failures {
            Err(unavailable())
        } else {
            Ok(n)
        }
    }

    #[test]
    fn backoff_doubles() {
        let policy = no_jitter();
        assert_eq!(policy.backoff(1), Duration::from_secs(1));
        assert_eq!(policy.backoff(2), Duration::from_secs(2));
        assert_eq!(policy.backoff(3), Duration::from_secs(4));
        assert_eq!(policy.backoff(5), Duration::from_secs(16));
    }

    #[test]
    fn backoff_saturates() {
        let policy = no_jitter();
        assert!(policy.backoff(200) >= policy.backoff(32));
    }

    #[test]
    fn jitter_stays_within_bound() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(100),
            max_jitter: Duration::from_millis(50),
            max_attempts: 5,
        };
        for _ in 0..200 {
            let delay = policy.delay_for(1);
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(150));
        }
    }

    #[test]
    fn backoff_yields_one_delay_per_retry() {
        let delays: Vec<_> = no_jitter().build().collect();
        assert_eq!(
            delays,
            [1, 2, 4, 8].map(Duration::from_secs).to_vec()
        );

        assert_eq!(RetryPolicy::immediate(1).build().count(), 0);
        assert_eq!(RetryPolicy::immediate(0).build().count(), 0);
    }

    #[test]
    fn zero_jitter_is_exact() {
        let policy = no_jitter();
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_k_transient_failures() {
        for k in 0..5 {
            let calls = AtomicU32::new(0);
            let client = ResilientClient::new(no_jitter());

            let result = client.execute("flaky", || flaky(&calls, k)).await;

            assert_eq!(result, Ok(k + 1));
            assert_eq!(calls.load(Ordering::SeqCst), k + 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_after_five_attempts() {
        let calls = AtomicU32::new(0);
        let client = ResilientClient::new(no_jitter());

        let result = client.execute("down", || flaky(&calls, u32::MAX)).await;

        assert_eq!(
            result,
            Err(RemoteError::RetryExhausted {
                last_status: 503,
                attempts: 5
            })
        );
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_exponentially_between_attempts() {
        let calls = AtomicU32::new(0);
        let client = ResilientClient::new(no_jitter());
        let start = Instant::now();

        client
            .execute("flaky", || flaky(&calls, 3))
            .await
            .unwrap();

        // 1s + 2s + 4s
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(7), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(8), "elapsed {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_is_not_retried() {
        let calls = AtomicU32::new(0);
        let client = ResilientClient::new(RetryPolicy::default());
        let start = Instant::now();

        let result: Result<(), _> = client
            .execute("missing", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(RemoteError::from_status(404, "gone")) }
            })
            .await;

        assert!(result.unwrap_err().is_not_found());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn other_errors_propagate_unchanged() {
        for err in [
            RemoteError::from_status(500, "boom"),
            RemoteError::RateLimited,
            RemoteError::NetworkError("reset".into()),
            RemoteError::AuthFailed("bad token".into()),
        ] {
            let calls = AtomicU32::new(0);
            let client = ResilientClient::new(RetryPolicy::default());
            let expected = err.clone();

            let result: Result<(), _> = client
                .execute("fails", || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    let err = err.clone();
                    async move { Err(err) }
                })
                .await;

            assert_eq!(result, Err(expected));
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn transient_then_permanent_stops_early() {
        let calls = AtomicU32::new(0);
        let client = ResilientClient::new(no_jitter());

        let result: Result<(), _> = client
            .execute("mixed", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(RemoteError::from_status(504, "timeout"))
                    } else {
                        Err(RemoteError::from_status(404, "gone"))
                    }
                }
            })
            .await;

        assert!(result.unwrap_err().is_not_found());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn custom_attempt_budget() {
        let calls = AtomicU32::new(0);
        let client = ResilientClient::new(RetryPolicy::immediate(2));

        let result = client.execute("down", || flaky(&calls, u32::MAX)).await;

        assert!(matches!(
            result,
            Err(RemoteError::RetryExhausted { attempts: 2, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_attempts_still_tries_once() {
        let calls = AtomicU32::new(0);
        let client = ResilientClient::new(RetryPolicy::immediate(0));

        let result = client.execute("once", || flaky(&calls, 0)).await;

        assert_eq!(result, Ok(1));
    }
}
