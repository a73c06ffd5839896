//! Access token lifecycle
//!
//! [`TokenManager`] owns the session's cached [`Token`]. Every read and every
//! refresh happens under one async mutex, so at most one token exchange is in
//! flight per session and callers queued behind it receive its result.
//!
//! Token lifecycle:
//! 1. The first authenticated call acquires a token (client-credentials grant).
//! 2. The token is cached in memory for the lifetime of the manager.
//! 3. A token within the refresh margin of expiry is replaced before use,
//!    using the refresh grant when a refresh token is held and falling back to
//!    client credentials when the service rejects it.
//! 4. After a 401, [`TokenManager::refresh_rejected`] replaces the rejected
//!    token unless a concurrent caller already did.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::config::ClientConfig;
use crate::constants::endpoints;
use crate::credentials::{Credential, Token};
use crate::error::{ApiError, ErrorKind, Result};
use crate::mapper::map_response;
use crate::transport::{PreparedRequest, RequestSpec, ResponseEnvelope, Transport};

/// Token endpoint success body
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: u64,
    #[serde(default)]
    scope: Option<String>,
}

impl TokenResponse {
    fn into_token(self) -> Token {
        let expires_at = i64::try_from(self.expires_in)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Token {
            access_token: self.access_token,
            refresh_token: self.refresh_token.filter(|t| !t.is_empty()),
            expires_at,
            scope: self.scope.unwrap_or_else(|| "read write".to_string()),
        }
    }
}

/// Which grant an exchange uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grant {
    ClientCredentials,
    RefreshToken,
}

impl Grant {
    fn as_str(&self) -> &'static str {
        match self {
            Grant::ClientCredentials => "client_credentials",
            Grant::RefreshToken => "refresh_token",
        }
    }
}

/// Obtains, caches and refreshes access tokens
pub struct TokenManager {
    /// Client identity
    credential: Credential,
    /// Transport for token exchanges
    transport: Arc<dyn Transport>,
    /// Cached token; the lock also serializes exchanges
    cache: Mutex<Option<Token>>,
    /// Tokens this close to expiry are refreshed before use
    refresh_margin: Duration,
    /// Timeout for one exchange
    timeout: Duration,
}

impl TokenManager {
    /// Create a manager with an empty cache
    pub fn new(credential: Credential, transport: Arc<dyn Transport>, config: &ClientConfig) -> Self {
        Self {
            credential,
            transport,
            cache: Mutex::new(None),
            refresh_margin: config.effective_refresh_margin(),
            timeout: config.timeout,
        }
    }

    /// Get the client id this manager authenticates as
    pub fn client_id(&self) -> &str {
        self.credential.client_id()
    }

    /// Return a token that is not expired (within the refresh margin)
    ///
    /// Acquires or refreshes when nothing is cached or the cached token is
    /// stale. Network failures are returned as-is; retrying is the caller's
    /// job.
    pub async fn get_valid_token(&self) -> Result<Token> {
        let mut cache = self.cache.lock().await;

        if let Some(token) = cache.as_ref() {
            if !token.is_expired(self.refresh_margin) {
                return Ok(token.clone());
            }
            tracing::debug!(
                client_id = self.client_id(),
                "Cached access token is expiring, refreshing"
            );
        }

        self.exchange(&mut cache).await
    }

    /// Always perform an exchange, replacing the cached token
    pub async fn force_refresh(&self) -> Result<Token> {
        let mut cache = self.cache.lock().await;
        self.exchange(&mut cache).await
    }

    /// Replace a token the service rejected with 401
    ///
    /// If another caller has already swapped in a different, still-valid token
    /// while this one waited for the lock, that token is returned without a
    /// new exchange.
    pub async fn refresh_rejected(&self, rejected_access_token: &str) -> Result<Token> {
        let mut cache = self.cache.lock().await;

        if let Some(token) = cache.as_ref() {
            if token.access_token != rejected_access_token && !token.is_expired(self.refresh_margin) {
                tracing::debug!(
                    client_id = self.client_id(),
                    "Rejected token already replaced by a concurrent refresh"
                );
                return Ok(token.clone());
            }
        }

        self.exchange(&mut cache).await
    }

    /// Drop the cached token so the next call re-authenticates
    pub async fn invalidate(&self) {
        let mut cache = self.cache.lock().await;
        *cache = None;
    }

    /// Copy of the cached token, if any
    pub async fn cached_token(&self) -> Option<Token> {
        self.cache.lock().await.clone()
    }

    /// Run an exchange and store the result; the caller holds the lock
    async fn exchange(&self, cache: &mut Option<Token>) -> Result<Token> {
        let refresh_token = cache.as_ref().and_then(|t| t.refresh_token.clone());

        let token = match refresh_token {
            Some(refresh_token) => match self
                .request_token(Grant::RefreshToken, Some(&refresh_token))
                .await
            {
                Ok(token) => token,
                // Throttling and outages are left to the retry loop
                Err(e) if e.kind() != ErrorKind::Authentication => return Err(e),
                Err(e) => {
                    tracing::debug!(
                        client_id = self.client_id(),
                        error = %e,
                        "Refresh grant rejected, falling back to client credentials"
                    );
                    self.request_token(Grant::ClientCredentials, None).await?
                }
            },
            None => self.request_token(Grant::ClientCredentials, None).await?,
        };

        *cache = Some(token.clone());
        Ok(token)
    }

    async fn request_token(&self, grant: Grant, refresh_token: Option<&str>) -> Result<Token> {
        let body = match grant {
            Grant::ClientCredentials => json!({
                "grant_type": grant.as_str(),
                "client_id": self.credential.client_id(),
                "client_secret": self.credential.client_secret(),
            }),
            Grant::RefreshToken => json!({
                "grant_type": grant.as_str(),
                "refresh_token": refresh_token.unwrap_or_default(),
            }),
        };

        let spec = RequestSpec::post(endpoints::TOKEN)
            .unauthenticated()
            .json(&body)?;
        let request = PreparedRequest {
            spec,
            bearer: None,
            timeout: self.timeout,
        };

        let response = self.transport.send(&request).await?;
        if !response.is_success() {
            let error = token_failure(&response);
            tracing::warn!(
                client_id = self.client_id(),
                grant = grant.as_str(),
                status = response.status,
                error = %error,
                "Token exchange failed"
            );
            return Err(error);
        }

        let wire: TokenResponse = response.decode()?;
        tracing::info!(
            client_id = self.client_id(),
            grant = grant.as_str(),
            expires_in = wire.expires_in,
            "Access token acquired"
        );

        Ok(wire.into_token())
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("credential", &self.credential)
            .field("refresh_margin", &self.refresh_margin)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Map a failed token exchange
///
/// Throttling and server faults keep their retryable kinds; any other
/// rejection means the credentials are no good.
fn token_failure(response: &ResponseEnvelope) -> ApiError {
    match map_response(response) {
        error @ (ApiError::RateLimit { .. } | ApiError::Server { .. } | ApiError::Authentication { .. }) => {
            error
        }
        other => ApiError::Authentication {
            error: other.code().to_string(),
            description: other.message().to_string(),
        },
    }
}
