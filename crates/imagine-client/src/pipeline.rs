//! Request pipeline
//!
//! Turns a [`RequestSpec`] into a successful [`ResponseEnvelope`] or a terminal
//! [`ApiError`]. For each attempt it attaches a bearer token, sends through the
//! [`Transport`], and classifies the outcome:
//!
//! - 2xx is returned as-is
//! - the first 401 of a call replaces the rejected token and resends at once,
//!   outside the retry budget; a second 401 is terminal
//! - 429, 5xx and network failures are retried per [`RetryConfig`]
//! - everything else is mapped by [`map_response`] and returned
//!
//! Attempts for one call are strictly sequential. An optional budget bounds
//! the whole call, backoff delays included.

use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::mapper::map_response;
use crate::retry::{RetryConfig, RetryDecision};
use crate::token::TokenManager;
use crate::transport::{PreparedRequest, RequestSpec, ResponseEnvelope, Transport};

/// Per-call bookkeeping
#[derive(Debug, Default)]
struct CallState {
    /// Retries spent against the budget
    retries: usize,
    /// Whether the one forced refresh has been used
    refreshed: bool,
    /// Access token the service rejected, awaiting replacement
    rejected: Option<String>,
    /// Most recent retryable failure
    last_error: Option<ApiError>,
}

/// Result of a single attempt
enum Attempt {
    /// A response arrived, sent with this bearer token
    Response(ResponseEnvelope, Option<String>),
    /// No response (token acquisition or transport failure)
    Failed(ApiError),
}

/// Executes requests with authentication, retries and error mapping
pub struct RequestPipeline {
    transport: Arc<dyn Transport>,
    tokens: Arc<TokenManager>,
    retry: RetryConfig,
    timeout: Duration,
    call_timeout: Option<Duration>,
}

impl RequestPipeline {
    /// Create a pipeline over a transport and token manager
    pub fn new(
        transport: Arc<dyn Transport>,
        tokens: Arc<TokenManager>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            transport,
            tokens,
            retry: config.retry.clone(),
            timeout: config.timeout,
            call_timeout: config.call_timeout,
        }
    }

    /// Get the token manager
    pub fn token_manager(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    /// Get the retry configuration
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Execute a request, bounded by the configured call timeout if any
    pub async fn execute(&self, spec: &RequestSpec) -> Result<ResponseEnvelope> {
        self.run(spec, self.call_timeout).await
    }

    /// Execute a request, bounding all attempts and delays by `budget`
    pub async fn execute_within(
        &self,
        spec: &RequestSpec,
        budget: Duration,
    ) -> Result<ResponseEnvelope> {
        self.run(spec, Some(budget)).await
    }

    /// Execute a request and decode the success body
    pub async fn execute_json<T: DeserializeOwned>(&self, spec: &RequestSpec) -> Result<T> {
        self.execute(spec).await?.decode()
    }

    async fn run(&self, spec: &RequestSpec, budget: Option<Duration>) -> Result<ResponseEnvelope> {
        // A budget past the clock's range is no bound at all
        let deadline = budget.and_then(|budget| Instant::now().checked_add(budget));
        let mut state = CallState::default();

        loop {
            let remaining = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Err(state
                            .last_error
                            .take()
                            .unwrap_or_else(|| budget_exhausted(spec, budget)));
                    }
                    Some(remaining)
                }
                None => None,
            };

            let attempt = match remaining {
                Some(remaining) => {
                    match tokio::time::timeout(remaining, self.attempt(spec, &mut state, remaining))
                        .await
                    {
                        Ok(attempt) => attempt,
                        Err(_) => {
                            return Err(state
                                .last_error
                                .take()
                                .unwrap_or_else(|| budget_exhausted(spec, budget)))
                        }
                    }
                }
                None => self.attempt(spec, &mut state, self.timeout).await,
            };

            let failure = match attempt {
                Attempt::Response(response, _) if response.is_success() => return Ok(response),
                Attempt::Response(response, Some(bearer))
                    if response.status == 401 && !state.refreshed =>
                {
                    tracing::debug!(
                        method = spec.method.as_str(),
                        path = %spec.path,
                        "Access token rejected, refreshing"
                    );
                    state.refreshed = true;
                    state.rejected = Some(bearer);
                    continue;
                }
                Attempt::Response(response, _) => map_response(&response),
                Attempt::Failed(error) => error,
            };

            let delay = match self.retry.decide(state.retries, &failure) {
                RetryDecision::GiveUp => return Err(failure),
                RetryDecision::Retry(delay) => delay,
            };

            if let Some(deadline) = deadline {
                let resume_at = Instant::now().checked_add(delay);
                if !resume_at.is_some_and(|at| at < deadline) {
                    tracing::warn!(
                        method = spec.method.as_str(),
                        path = %spec.path,
                        error = %failure,
                        "Call budget exhausted before next retry"
                    );
                    return Err(failure);
                }
            }

            state.retries += 1;
            tracing::warn!(
                method = spec.method.as_str(),
                path = %spec.path,
                attempt = state.retries,
                delay_ms = delay.as_millis() as u64,
                error = %failure,
                "Request failed, retrying"
            );
            state.last_error = Some(failure);
            tokio::time::sleep(delay).await;
        }
    }

    async fn attempt(&self, spec: &RequestSpec, state: &mut CallState, remaining: Duration) -> Attempt {
        let bearer = if spec.requires_auth {
            let token = match state.rejected.as_deref() {
                Some(rejected) => self.tokens.refresh_rejected(rejected).await,
                None => self.tokens.get_valid_token().await,
            };
            match token {
                Ok(token) => {
                    state.rejected = None;
                    Some(token.access_token)
                }
                Err(e) => return Attempt::Failed(e),
            }
        } else {
            None
        };

        let request = PreparedRequest {
            spec: spec.clone(),
            bearer,
            timeout: remaining.min(self.timeout),
        };

        tracing::debug!(
            method = spec.method.as_str(),
            path = %spec.path,
            "Sending request"
        );

        match self.transport.send(&request).await {
            Ok(response) => Attempt::Response(response, request.bearer),
            Err(e) => Attempt::Failed(e),
        }
    }
}

impl std::fmt::Debug for RequestPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPipeline")
            .field("tokens", &self.tokens)
            .field("retry", &self.retry)
            .field("timeout", &self.timeout)
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}

fn budget_exhausted(spec: &RequestSpec, budget: Option<Duration>) -> ApiError {
    ApiError::network(format!(
        "{} {} exceeded call timeout of {:?}",
        spec.method.as_str(),
        spec.path,
        budget.unwrap_or_default()
    ))
}
