//! Retry policy with exponential backoff
//!
//! Retry decisions are a pure function of the number of retries already spent
//! and the failure just observed, so they can be tested without a network.
//! The [`RequestPipeline`](crate::pipeline::RequestPipeline) performs the I/O
//! and sleeping.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::error::ApiError;

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt
    pub max_retries: usize,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Backoff multiplier (e.g., 2.0 for exponential backoff)
    pub backoff_multiplier: f64,
    /// Longest server-requested wait the client will sit out
    pub max_retry_after: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            max_retry_after: Duration::from_secs(60),
        }
    }
}

/// Outcome of a retry decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait this long, then try again
    Retry(Duration),
    /// Surface the error to the caller
    GiveUp,
}

impl RetryConfig {
    /// Create a new retry configuration
    pub fn new(max_retries: usize) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Disable retries entirely
    pub fn disabled() -> Self {
        Self::new(0)
    }

    /// Set the initial delay
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum delay
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the backoff multiplier
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Set the longest `Retry-After` wait to honor
    pub fn with_max_retry_after(mut self, limit: Duration) -> Self {
        self.max_retry_after = limit;
        self
    }

    /// Calculate the backoff delay before retry number `retry_index` (0-based)
    ///
    /// Non-decreasing in `retry_index` for any multiplier >= 1.
    pub fn delay_for(&self, retry_index: usize) -> Duration {
        let exponent = i32::try_from(retry_index).unwrap_or(i32::MAX);
        let delay_ms =
            self.initial_delay.as_millis() as f64 * self.backoff_multiplier.max(1.0).powi(exponent);

        let max_ms = self.max_delay.as_millis() as f64;
        if !delay_ms.is_finite() || delay_ms >= max_ms {
            self.max_delay
        } else {
            Duration::from_millis(delay_ms as u64)
        }
    }

    /// Decide what to do after `failure`, given `retries_so_far` retries spent
    ///
    /// Non-retryable kinds give up immediately. A server-provided retry hint
    /// replaces the computed backoff; a hint longer than `max_retry_after`
    /// gives up so the caller sees the rate limit instead of blocking.
    ///
    /// # Examples
    /// ```
    /// use imagine_client::error::ApiError;
    /// use imagine_client::retry::{RetryConfig, RetryDecision};
    /// use std::time::Duration;
    ///
    /// let config = RetryConfig::new(2).with_initial_delay(Duration::from_millis(100));
    /// let failure = ApiError::network("connection reset");
    ///
    /// assert_eq!(config.decide(0, &failure), RetryDecision::Retry(Duration::from_millis(100)));
    /// assert_eq!(config.decide(1, &failure), RetryDecision::Retry(Duration::from_millis(200)));
    /// assert_eq!(config.decide(2, &failure), RetryDecision::GiveUp);
    /// ```
    pub fn decide(&self, retries_so_far: usize, failure: &ApiError) -> RetryDecision {
        if !failure.is_retryable() || retries_so_far >= self.max_retries {
            return RetryDecision::GiveUp;
        }

        match failure.retry_after() {
            Some(hint) if hint > self.max_retry_after => RetryDecision::GiveUp,
            Some(hint) => RetryDecision::Retry(hint),
            None => RetryDecision::Retry(self.delay_for(retries_so_far)),
        }
    }
}

/// Parse a `Retry-After` value
///
/// Accepts delta-seconds (`"5"`, `"1.5"`) or an HTTP date
/// (`"Wed, 21 Oct 2015 07:28:00 GMT"`). Dates in the past yield zero.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    parse_retry_after_at(value, Utc::now())
}

fn parse_retry_after_at(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(secs) = value.parse::<f64>() {
        return Duration::try_from_secs_f64(secs).ok();
    }

    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_error() -> ApiError {
        ApiError::Server {
            status: 503,
            error: "unavailable".into(),
            message: "down".into(),
        }
    }

    #[test]
    fn test_retry_config_delay_for() {
        let config = RetryConfig::new(3)
            .with_initial_delay(Duration::from_millis(100))
            .with_backoff_multiplier(2.0)
            .with_max_delay(Duration::from_secs(5));

        assert_eq!(config.delay_for(0), Duration::from_millis(100));
        assert_eq!(config.delay_for(1), Duration::from_millis(200));
        assert_eq!(config.delay_for(2), Duration::from_millis(400));
        assert_eq!(config.delay_for(3), Duration::from_millis(800));
    }

    #[test]
    fn test_retry_config_max_delay() {
        let config = RetryConfig::new(10)
            .with_initial_delay(Duration::from_millis(100))
            .with_backoff_multiplier(2.0)
            .with_max_delay(Duration::from_secs(1));

        // After enough attempts, should cap at max_delay
        assert_eq!(config.delay_for(10), Duration::from_secs(1));
        assert_eq!(config.delay_for(usize::MAX), Duration::from_secs(1));
    }

    #[test]
    fn test_delays_non_decreasing() {
        let config = RetryConfig::default();
        let delays: Vec<Duration> = (0..20).map(|i| config.delay_for(i)).collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]), "{delays:?}");
    }

    #[test]
    fn test_decide_gives_up_on_terminal_kinds() {
        let config = RetryConfig::new(3);
        let terminal = [
            ApiError::invalid_input("validation_error", "bad"),
            ApiError::NotFound {
                error: "not_found".into(),
                message: "gone".into(),
            },
            ApiError::Authentication {
                error: "invalid_client".into(),
                description: "nope".into(),
            },
        ];
        for error in &terminal {
            assert_eq!(config.decide(0, error), RetryDecision::GiveUp);
        }
    }

    #[test]
    fn test_decide_exhausts_budget() {
        let config = RetryConfig::new(3).with_initial_delay(Duration::from_millis(10));
        let error = server_error();

        assert!(matches!(config.decide(0, &error), RetryDecision::Retry(_)));
        assert!(matches!(config.decide(2, &error), RetryDecision::Retry(_)));
        assert_eq!(config.decide(3, &error), RetryDecision::GiveUp);
        assert_eq!(RetryConfig::disabled().decide(0, &error), RetryDecision::GiveUp);
    }

    #[test]
    fn test_decide_honours_retry_after() {
        let config = RetryConfig::new(3).with_initial_delay(Duration::from_millis(10));
        let error = ApiError::RateLimit {
            error: "rate_limited".into(),
            message: "slow down".into(),
            retry_after: Some(Duration::from_secs(7)),
        };

        assert_eq!(
            config.decide(1, &error),
            RetryDecision::Retry(Duration::from_secs(7))
        );
    }

    #[test]
    fn test_decide_gives_up_on_long_retry_after() {
        let config = RetryConfig::new(3);
        let error = ApiError::RateLimit {
            error: "rate_limited".into(),
            message: "come back tomorrow".into(),
            retry_after: Some(Duration::from_secs(86_400)),
        };
        assert_eq!(config.decide(0, &error), RetryDecision::GiveUp);

        let patient = config.with_max_retry_after(Duration::from_secs(86_400));
        assert_eq!(
            patient.decide(0, &error),
            RetryDecision::Retry(Duration::from_secs(86_400))
        );
    }

    #[test]
    fn test_parse_retry_after_seconds() {
        assert_eq!(parse_retry_after("5"), Some(Duration::from_secs(5)));
        assert_eq!(parse_retry_after(" 0 "), Some(Duration::ZERO));
        assert_eq!(parse_retry_after("1.5"), Some(Duration::from_millis(1500)));
        assert_eq!(parse_retry_after("-3"), None);
        assert_eq!(parse_retry_after("soon"), None);
        assert_eq!(parse_retry_after(""), None);
    }

    #[test]
    fn test_parse_retry_after_out_of_range() {
        assert_eq!(parse_retry_after("1e30"), None);
        assert_eq!(parse_retry_after("inf"), None);
        assert_eq!(parse_retry_after("NaN"), None);
        assert!(parse_retry_after("1.5e19").is_some());
    }

    #[test]
    fn test_parse_retry_after_http_date() {
        let now = DateTime::parse_from_rfc2822("Wed, 21 Oct 2015 07:28:00 GMT")
            .unwrap()
            .with_timezone(&Utc);

        assert_eq!(
            parse_retry_after_at("Wed, 21 Oct 2015 07:28:30 GMT", now),
            Some(Duration::from_secs(30))
        );
        assert_eq!(
            parse_retry_after_at("Wed, 21 Oct 2015 07:27:00 GMT", now),
            Some(Duration::ZERO)
        );
    }
}
