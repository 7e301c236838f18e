//! Retry with exponential backoff for transient provider failures

use crate::provider::ProviderError;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Largest backoff exponent; keeps the shift from overflowing
const MAX_BACKOFF_EXPONENT: u32 = 16;

/// How often and how patiently to retry the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first one included. Zero behaves like one.
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubles on each further failure
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay: Duration::from_secs(1) }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self { max_attempts, base_delay }
    }

    /// Never retry
    pub fn none() -> Self {
        Self { max_attempts: 1, base_delay: Duration::ZERO }
    }

    /// Backoff after failed attempt number `attempt` (0-based): base × 2^attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.min(MAX_BACKOFF_EXPONENT);
        self.base_delay.saturating_mul(factor)
    }

    /// Upper bound on total time spent sleeping between attempts
    pub fn max_total_delay(&self) -> Duration {
        (0..self.max_attempts.max(1) - 1)
            .map(|attempt| self.delay_for(attempt))
            .fold(Duration::ZERO, Duration::saturating_add)
    }

    /// Run `call` until it succeeds, fails non-transiently, or attempts run out
    ///
    /// Only [`ProviderError::is_transient`] failures are retried. The last
    /// error is returned unchanged. Dropping the returned future cancels any
    /// pending backoff sleep.
    pub async fn run<T, F, Fut>(&self, label: &(dyn Display + Sync), mut call: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt + 1 < attempts => {
                    let delay = self.delay_for(attempt);
                    log::warn!(
                        "Transient provider failure for {}: {} (attempt {} of {}), retrying in {:?}",
                        label,
                        err,
                        attempt + 1,
                        attempts,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_transient() {
                        log::warn!("Giving up on {} after {} attempts: {}", label, attempts, err);
                    }
                    return Err(err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    async fn failing_then_ok(
        counter: &AtomicU32,
        fail_first_n: u32,
        failure: ProviderError,
    ) -> Result<&'static str, ProviderError> {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        if n < fail_first_n {
            Err(failure)
        } else {
            Ok("data")
        }
    }

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100));
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
        assert_eq!(policy.max_total_delay(), Duration::from_millis(1500));
    }

    #[test]
    fn test_huge_attempt_does_not_overflow() {
        let policy = RetryPolicy::new(100, Duration::from_secs(1));
        assert_eq!(policy.delay_for(90), Duration::from_secs(1 << MAX_BACKOFF_EXPONENT));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let counter = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        let start = Instant::now();

        let result = policy
            .run(&"hvac", || {
                failing_then_ok(&counter, 2, ProviderError::ConnectionFailed("refused".into()))
            })
            .await;

        assert_eq!(result, Ok("data"));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_returns_last_error() {
        let counter = AtomicU32::new(0);
        let policy = RetryPolicy::new(2, Duration::from_millis(100));

        let result = policy
            .run(&"hvac", || failing_then_ok(&counter, 10, ProviderError::Timeout("slow".into())))
            .await;

        assert_eq!(result, Err(ProviderError::Timeout("slow".into())));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_is_not_retried() {
        let counter = AtomicU32::new(0);
        let policy = RetryPolicy::new(5, Duration::from_millis(100));
        let start = Instant::now();

        let result = policy
            .run(&"hvac", || failing_then_ok(&counter, 10, ProviderError::RateLimited("429".into())))
            .await;

        assert!(matches!(result, Err(ProviderError::RateLimited(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_zero_attempts_means_one() {
        let counter = AtomicU32::new(0);
        let policy = RetryPolicy::new(0, Duration::from_millis(100));

        let result = policy
            .run(&"hvac", || failing_then_ok(&counter, 10, ProviderError::ConnectionFailed("refused".into())))
            .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
