use std::time::Duration;

use crate::config::RetryConfig;

/// High-level classification of an error for retry purposes.
///
/// This intentionally stays generic; store clients map HTTP status codes,
/// curl errors, or IO failures into these kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation timed out (connect/read).
    Timeout,
    /// Server asked us to slow down (e.g. 429, 503).
    Throttled,
    /// Network-level failure (connection reset, DNS, etc.).
    Connection,
    /// HTTP status that is retryable but not strictly throttling (5xx).
    Http5xx(u16),
    /// Any other error (never retried).
    Other,
}

impl ErrorKind {
    pub fn is_retryable(self) -> bool {
        self != ErrorKind::Other
    }
}

/// Longest single backoff the policy will ever hand out.
pub const MAX_BACKOFF: Duration = Duration::from_secs(24 * 60 * 60);

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Exponential backoff policy with caps: `base_delay * 2^(attempt-1)`, at most `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Base delay for backoff.
    pub base_delay: Duration,
    /// Upper bound on backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            base_delay: Duration::try_from_secs_f64(cfg.base_delay_secs.max(0.0))
                .unwrap_or(MAX_BACKOFF)
                .min(MAX_BACKOFF),
            max_delay: Duration::from_secs(cfg.max_delay_secs).min(MAX_BACKOFF),
        }
    }
}

impl RetryPolicy {
    /// Compute the next backoff delay for a given attempt and error kind.
    ///
    /// `attempt` is 1-based (1 = first attempt). Returns `RetryDecision::NoRetry`
    /// when we should stop retrying.
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        if attempt >= self.max_attempts || !kind.is_retryable() {
            return RetryDecision::NoRetry;
        }
        RetryDecision::RetryAfter(self.backoff(attempt))
    }

    /// Delay before the attempt that follows `attempt`. Never above [`MAX_BACKOFF`].
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = 1u32 << attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(exp)
            .min(self.max_delay)
            .min(MAX_BACKOFF)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_retry_for_other() {
        let p = RetryPolicy::default();
        assert_eq!(p.decide(1, ErrorKind::Other), RetryDecision::NoRetry);
    }

    #[test]
    fn exponential_backoff_doubles_and_is_capped() {
        let p = RetryPolicy {
            max_attempts: 40,
            ..RetryPolicy::default()
        };
        assert_eq!(p.decide(1, ErrorKind::Timeout), RetryDecision::RetryAfter(Duration::from_millis(250)));
        assert_eq!(p.decide(2, ErrorKind::Timeout), RetryDecision::RetryAfter(Duration::from_millis(500)));
        assert_eq!(p.decide(3, ErrorKind::Connection), RetryDecision::RetryAfter(Duration::from_secs(1)));
        assert_eq!(p.backoff(30), p.max_delay);
    }

    #[test]
    fn respects_max_attempts() {
        let p = RetryPolicy {
            max_attempts: 3,
            ..RetryPolicy::default()
        };
        assert!(matches!(
            p.decide(1, ErrorKind::Throttled),
            RetryDecision::RetryAfter(_)
        ));
        assert!(matches!(
            p.decide(2, ErrorKind::Http5xx(502)),
            RetryDecision::RetryAfter(_)
        ));
        assert_eq!(p.decide(3, ErrorKind::Throttled), RetryDecision::NoRetry);
    }

    #[test]
    fn from_config() {
        let cfg = RetryConfig {
            max_attempts: 3,
            base_delay_secs: 0.5,
            max_delay_secs: 15,
        };
        let p = RetryPolicy::from(&cfg);
        assert_eq!(p.max_attempts, 3);
        assert_eq!(p.base_delay, Duration::from_millis(500));
        assert_eq!(p.max_delay, Duration::from_secs(15));
    }

    #[test]
    fn from_config_clamps_out_of_range_delays() {
        let cfg = RetryConfig {
            max_attempts: 3,
            base_delay_secs: 1e30,
            max_delay_secs: u64::MAX,
        };
        let p = RetryPolicy::from(&cfg);
        assert_eq!(p.base_delay, MAX_BACKOFF);
        assert_eq!(p.max_delay, MAX_BACKOFF);
        assert_eq!(
            p.decide(1, ErrorKind::Timeout),
            RetryDecision::RetryAfter(MAX_BACKOFF)
        );

        let nan = RetryConfig {
            base_delay_secs: f64::NAN,
            ..cfg
        };
        assert!(RetryPolicy::from(&nan).base_delay <= MAX_BACKOFF);
    }

    #[test]
    fn hand_built_policy_backoff_is_capped() {
        let p = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::MAX,
            max_delay: Duration::MAX,
        };
        assert_eq!(p.backoff(9), MAX_BACKOFF);
    }
}
