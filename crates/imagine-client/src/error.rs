//! Error taxonomy
//!
//! Every failure surfaced by the client is one of six kinds. Callers branch on
//! [`ApiError::kind`] (or match the variants directly) rather than parsing
//! message text.
//!
//! # Examples
//! ```
//! use imagine_client::error::{ApiError, ErrorKind};
//! use std::time::Duration;
//!
//! let error = ApiError::RateLimit {
//!     error: "rate_limited".to_string(),
//!     message: "Slow down".to_string(),
//!     retry_after: Some(Duration::from_secs(5)),
//! };
//! assert_eq!(error.kind(), ErrorKind::RateLimit);
//! assert!(error.is_retryable());
//! assert_eq!(error.retry_after(), Some(Duration::from_secs(5)));
//! ```

use std::time::Duration;
use thiserror::Error;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors returned by the client
///
/// Messages originate from the remote service or from local argument checks.
/// Request bodies are never copied into an error, so client secrets and API
/// keys cannot leak through `Display` or `Debug`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// Credentials were rejected, or a refreshed token was rejected again
    #[error("Authentication error: {error}: {description}")]
    Authentication {
        /// Error code from the service (e.g. "invalid_client")
        error: String,
        /// Human-readable description
        description: String,
    },

    /// The request was malformed or refused (400, 403, 422 and other 4xx)
    #[error("Validation error: {error}: {message}")]
    Validation {
        /// HTTP status, `None` when the check failed before sending
        status: Option<u16>,
        /// Error code
        error: String,
        /// Human-readable message
        message: String,
        /// Raw response body, when the service returned JSON
        details: Option<serde_json::Value>,
    },

    /// The target resource does not exist (404)
    #[error("Not found: {error}: {message}")]
    NotFound {
        /// Error code
        error: String,
        /// Human-readable message
        message: String,
    },

    /// The service throttled the client (429)
    #[error("Rate limited: {error}: {message}")]
    RateLimit {
        /// Error code
        error: String,
        /// Human-readable message
        message: String,
        /// How long the service asked the client to wait, if it said
        retry_after: Option<Duration>,
    },

    /// The service failed (5xx) or answered with an unreadable body
    #[error("Server error ({status}): {error}: {message}")]
    Server {
        /// HTTP status
        status: u16,
        /// Error code
        error: String,
        /// Human-readable message
        message: String,
    },

    /// No response was received (connect failure, timeout, broken body)
    #[error("Network error: {message}")]
    Network {
        /// Description of the transport failure
        message: String,
    },
}

/// Fieldless discriminant of [`ApiError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`ApiError::Authentication`]
    Authentication,
    /// See [`ApiError::Validation`]
    Validation,
    /// See [`ApiError::NotFound`]
    NotFound,
    /// See [`ApiError::RateLimit`]
    RateLimit,
    /// See [`ApiError::Server`]
    Server,
    /// See [`ApiError::Network`]
    Network,
}

impl ApiError {
    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        ApiError::Network {
            message: message.into(),
        }
    }

    /// Create a validation error for an argument rejected before sending
    pub fn invalid_input(error: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Validation {
            status: None,
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Authentication { .. } => ErrorKind::Authentication,
            ApiError::Validation { .. } => ErrorKind::Validation,
            ApiError::NotFound { .. } => ErrorKind::NotFound,
            ApiError::RateLimit { .. } => ErrorKind::RateLimit,
            ApiError::Server { .. } => ErrorKind::Server,
            ApiError::Network { .. } => ErrorKind::Network,
        }
    }

    /// Check if the pipeline may retry after this error
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::RateLimit | ErrorKind::Server | ErrorKind::Network
        )
    }

    /// Get the server-provided retry hint (rate limits only)
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ApiError::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Get the HTTP status code, if the error came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Authentication { .. } => Some(401),
            ApiError::Validation { status, .. } => *status,
            ApiError::NotFound { .. } => Some(404),
            ApiError::RateLimit { .. } => Some(429),
            ApiError::Server { status, .. } => Some(*status),
            ApiError::Network { .. } => None,
        }
    }

    /// Get the service error code (e.g. "invalid_client")
    pub fn code(&self) -> &str {
        match self {
            ApiError::Authentication { error, .. }
            | ApiError::Validation { error, .. }
            | ApiError::NotFound { error, .. }
            | ApiError::RateLimit { error, .. }
            | ApiError::Server { error, .. } => error,
            ApiError::Network { .. } => "network_error",
        }
    }

    /// Get the human-readable message
    pub fn message(&self) -> &str {
        match self {
            ApiError::Authentication { description, .. } => description,
            ApiError::Validation { message, .. }
            | ApiError::NotFound { message, .. }
            | ApiError::RateLimit { message, .. }
            | ApiError::Server { message, .. }
            | ApiError::Network { message } => message,
        }
    }
}
