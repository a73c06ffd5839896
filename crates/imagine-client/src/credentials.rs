//! Client credentials and access tokens
//!
//! Plain storage types with no I/O. The secret and token strings are never
//! printed by `Debug` and neither type implements `Serialize`.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::error::{ApiError, Result};

/// Client identity used for the client-credentials grant
#[derive(Clone)]
pub struct Credential {
    client_id: String,
    client_secret: String,
}

impl Credential {
    /// Create a credential, rejecting empty values
    ///
    /// # Examples
    /// ```
    /// use imagine_client::credentials::Credential;
    ///
    /// let credential = Credential::new("agent_123", "s3cret").unwrap();
    /// assert_eq!(credential.client_id(), "agent_123");
    /// assert!(!format!("{:?}", credential).contains("s3cret"));
    ///
    /// assert!(Credential::new("", "s3cret").is_err());
    /// ```
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Result<Self> {
        let client_id = client_id.into();
        let client_secret = client_secret.into();

        if client_id.trim().is_empty() || client_secret.trim().is_empty() {
            return Err(ApiError::invalid_input(
                "missing_credentials",
                "Must provide client_id and client_secret, or client_id and api_key",
            ));
        }

        Ok(Self {
            client_id,
            client_secret,
        })
    }

    /// Get the client id
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Get the secret, for building the token exchange body only
    pub(crate) fn client_secret(&self) -> &str {
        &self.client_secret
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// An access token and its expiry
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    /// Bearer token sent with authenticated requests
    pub access_token: String,
    /// Token for the refresh grant, if the service issued one
    pub refresh_token: Option<String>,
    /// Absolute expiry
    pub expires_at: DateTime<Utc>,
    /// Granted scope
    pub scope: String,
}

impl Token {
    /// Check whether the token is expired, or will be within `margin`, at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        let margin = chrono::Duration::from_std(margin).unwrap_or(chrono::Duration::MAX);
        match now.checked_add_signed(margin) {
            Some(deadline) => deadline >= self.expires_at,
            None => true,
        }
    }

    /// Check whether the token is expired, or will be within `margin`, now
    pub fn is_expired(&self, margin: Duration) -> bool {
        self.is_expired_at(Utc::now(), margin)
    }

    /// Time remaining until expiry at `now` (zero once expired)
    pub fn expires_in(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).to_std().unwrap_or(Duration::ZERO)
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .finish()
    }
}
