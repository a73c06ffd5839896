//! Client configuration

use std::time::Duration;

use crate::constants::{DEFAULT_BASE_URL, USER_AGENT};
use crate::retry::RetryConfig;

/// Configuration shared by the token manager, pipeline and transport
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base service URL (e.g., "https://imagineanything.com")
    pub base_url: String,
    /// Timeout for a single HTTP exchange
    pub timeout: Duration,
    /// Budget for one logical call across all attempts and backoff delays
    pub call_timeout: Option<Duration>,
    /// Refresh tokens shortly before they expire instead of only on expiry/401
    pub auto_refresh: bool,
    /// How long before expiry a token counts as stale when `auto_refresh` is on
    pub refresh_margin: Duration,
    /// User agent string
    pub user_agent: String,
    /// Retry behavior for transient failures
    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            call_timeout: None,
            auto_refresh: true,
            refresh_margin: Duration::from_secs(30),
            user_agent: USER_AGENT.to_string(),
            retry: RetryConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Create a new config with a base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::default().with_base_url(base_url)
    }

    /// Set the base URL (a trailing slash is dropped)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the per-exchange timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Bound every logical call, retries included
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Enable or disable proactive token refresh
    pub fn with_auto_refresh(mut self, auto_refresh: bool) -> Self {
        self.auto_refresh = auto_refresh;
        self
    }

    /// Set the proactive refresh margin
    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the retry configuration
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Margin actually applied when checking token expiry
    pub fn effective_refresh_margin(&self) -> Duration {
        if self.auto_refresh {
            self.refresh_margin
        } else {
            Duration::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://imagineanything.com");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.call_timeout, None);
        assert!(config.auto_refresh);
        assert_eq!(config.retry.max_retries, 3);
        assert!(config.user_agent.starts_with("imagineanything-rust/"));
    }

    #[test]
    fn test_client_config_builder() {
        let config = ClientConfig::new("https://staging.example.com/")
            .with_timeout(Duration::from_secs(60))
            .with_call_timeout(Duration::from_secs(90))
            .with_user_agent("CustomAgent/1.0")
            .with_retry(RetryConfig::new(5));

        assert_eq!(config.base_url, "https://staging.example.com");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.call_timeout, Some(Duration::from_secs(90)));
        assert_eq!(config.user_agent, "CustomAgent/1.0");
        assert_eq!(config.retry.max_retries, 5);
    }

    #[test]
    fn test_auto_refresh_off_drops_margin() {
        let config = ClientConfig::default().with_refresh_margin(Duration::from_secs(300));
        assert_eq!(config.effective_refresh_margin(), Duration::from_secs(300));

        let config = config.with_auto_refresh(false);
        assert_eq!(config.effective_refresh_margin(), Duration::ZERO);
    }
}
