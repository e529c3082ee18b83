//! Retry strategies and predicates for transient failures.

use crate::Error;
use rand::Rng;
use std::time::Duration;

/// Determines how long to wait between retry attempts, and how many to make.
///
/// # Examples
///
/// ```
/// use wirecall::RetryStrategy;
/// use std::time::Duration;
///
/// // Fixed interval: 1s, 1s, 1s.
/// let fixed = RetryStrategy::Fixed {
///     interval: Duration::from_secs(1),
///     max_retries: 3,
/// };
///
/// // Exponential: 100ms, 200ms, 400ms... capped at 30s.
/// let backoff = RetryStrategy::ExponentialBackoff {
///     initial_delay: Duration::from_millis(100),
///     max_delay: Duration::from_secs(30),
///     max_retries: 5,
///     jitter: true,
/// };
/// ```
#[derive(Debug, Clone, Default)]
pub enum RetryStrategy {
    /// Do not retry failed requests.
    #[default]
    None,

    /// Retry with a fixed delay between attempts.
    Fixed {
        /// Delay between attempts.
        interval: Duration,
        /// Maximum retry attempts after the initial one.
        max_retries: usize,
    },

    /// Retry with exponentially increasing delays.
    ///
    /// Attempt `n` waits `initial_delay * 2^(n-1)`, capped at `max_delay`.
    /// Jitter scales each delay by a random factor in `[0.5, 1.0]` to avoid
    /// synchronized retries from multiple clients.
    ExponentialBackoff {
        /// Delay before the first retry.
        initial_delay: Duration,
        /// Upper bound on any single delay.
        max_delay: Duration,
        /// Maximum retry attempts after the initial one.
        max_retries: usize,
        /// Randomize delays.
        jitter: bool,
    },
}

impl RetryStrategy {
    /// Returns the delay before retry `attempt` (1-indexed), or `None` when
    /// the retry budget is spent.
    pub fn delay_for_attempt(&self, attempt: usize) -> Option<Duration> {
        match self {
            RetryStrategy::None => None,
            RetryStrategy::Fixed {
                interval,
                max_retries,
            } => (attempt <= *max_retries).then_some(*interval),
            RetryStrategy::ExponentialBackoff {
                initial_delay,
                max_delay,
                max_retries,
                jitter,
            } => {
                if attempt > *max_retries {
                    return None;
                }
                let multiplier = 2u64.saturating_pow(attempt.saturating_sub(1) as u32);
                let base = initial_delay.saturating_mul(multiplier.try_into().unwrap_or(u32::MAX));
                let delay = base.min(*max_delay);
                if *jitter {
                    let factor = rand::thread_rng().gen_range(0.5..=1.0);
                    Some(delay.mul_f64(factor))
                } else {
                    Some(delay)
                }
            }
        }
    }

    /// Returns the configured retry budget.
    pub fn max_retries(&self) -> usize {
        match self {
            RetryStrategy::None => 0,
            RetryStrategy::Fixed { max_retries, .. } => *max_retries,
            RetryStrategy::ExponentialBackoff { max_retries, .. } => *max_retries,
        }
    }
}

/// Decides whether a failed attempt should be retried.
///
/// # Examples
///
/// ```
/// use wirecall::{Error, RetryPredicate};
///
/// struct RetryOn503;
///
/// impl RetryPredicate for RetryOn503 {
///     fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
///         matches!(error, Error::Http { status, .. } if status.as_u16() == 503)
///     }
/// }
/// ```
pub trait RetryPredicate: Send + Sync {
    /// Returns `true` to retry after `error` on the given 1-indexed attempt.
    fn should_retry(&self, error: &Error, attempt: usize) -> bool;
}

/// Retry everything [`Error::is_retryable`] allows: network failures,
/// timeouts, 5xx, and 429.
#[derive(Debug, Clone, Copy)]
pub struct RetryOnRetryable;

impl RetryPredicate for RetryOnRetryable {
    fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
        error.is_retryable()
    }
}

/// Retry only on retryable HTTP statuses (5xx, 429), never on connection
/// failures or timeouts.
///
/// This is the default when
/// [`ClientConfig::retry_on_connection_failure`](crate::config::ClientConfig)
/// is off.
#[derive(Debug, Clone, Copy)]
pub struct RetryOnStatus;

impl RetryPredicate for RetryOnStatus {
    fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
        matches!(error, Error::Http { .. }) && error.is_retryable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, StatusCode};

    #[test]
    fn fixed_delays() {
        let strategy = RetryStrategy::Fixed {
            interval: Duration::from_secs(1),
            max_retries: 3,
        };

        assert_eq!(strategy.delay_for_attempt(1), Some(Duration::from_secs(1)));
        assert_eq!(strategy.delay_for_attempt(3), Some(Duration::from_secs(1)));
        assert_eq!(strategy.delay_for_attempt(4), None);
    }

    #[test]
    fn exponential_backoff_doubles_and_caps() {
        let strategy = RetryStrategy::ExponentialBackoff {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
            max_retries: 5,
            jitter: false,
        };

        assert_eq!(
            strategy.delay_for_attempt(1),
            Some(Duration::from_millis(100))
        );
        assert_eq!(
            strategy.delay_for_attempt(2),
            Some(Duration::from_millis(200))
        );
        assert_eq!(
            strategy.delay_for_attempt(3),
            Some(Duration::from_millis(400))
        );
        // Capped at max_delay from here on.
        assert_eq!(
            strategy.delay_for_attempt(4),
            Some(Duration::from_millis(500))
        );
        assert_eq!(strategy.delay_for_attempt(6), None);
    }

    #[test]
    fn no_retry() {
        assert_eq!(RetryStrategy::None.delay_for_attempt(1), None);
        assert_eq!(RetryStrategy::None.max_retries(), 0);
    }

    #[test]
    fn status_predicate_ignores_transport_failures() {
        let server_error = Error::Http {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            raw_response: String::new(),
            headers: HeaderMap::new(),
        };
        assert!(RetryOnStatus.should_retry(&server_error, 1));
        assert!(!RetryOnStatus.should_retry(&Error::Timeout, 1));
        assert!(RetryOnRetryable.should_retry(&Error::Timeout, 1));
    }
}
