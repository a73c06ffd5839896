//! Error mapping
//!
//! Converts a terminal (non-2xx) response into an [`ApiError`]. The mapping is
//! a pure function of the status code, headers and body; it never looks at
//! retry state.
//!
//! | Status         | Kind           |
//! |----------------|----------------|
//! | 401            | Authentication |
//! | 404            | NotFound       |
//! | 429            | RateLimit      |
//! | 500-599        | Server         |
//! | any other 4xx  | Validation     |

use serde_json::Value;
use std::time::Duration;

use crate::error::ApiError;
use crate::retry::parse_retry_after;
use crate::transport::ResponseEnvelope;

/// Map a response to the matching error kind
///
/// # Examples
/// ```
/// use imagine_client::error::ApiError;
/// use imagine_client::mapper::map_response;
/// use imagine_client::transport::ResponseEnvelope;
///
/// let response = ResponseEnvelope::json(404, &serde_json::json!({"message": "not found"}));
/// match map_response(&response) {
///     ApiError::NotFound { message, .. } => assert_eq!(message, "not found"),
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
pub fn map_response(response: &ResponseEnvelope) -> ApiError {
    let status = response.status;
    let body = response.json_value();
    let fields = ErrorFields::extract(body.as_ref(), response);

    match status {
        401 => ApiError::Authentication {
            error: fields.error,
            description: fields
                .description
                .or(fields.message)
                .or(fields.text)
                .unwrap_or_else(|| "Authentication failed".to_string()),
        },
        404 => ApiError::NotFound {
            error: fields.error,
            message: fields
                .message
                .or(fields.description)
                .or(fields.text)
                .unwrap_or_else(|| "Resource not found".to_string()),
        },
        429 => ApiError::RateLimit {
            error: fields.error,
            message: fields
                .message
                .or(fields.description)
                .or(fields.text)
                .unwrap_or_else(|| "Rate limit exceeded".to_string()),
            retry_after: retry_after_hint(response, body.as_ref()),
        },
        500..=599 => ApiError::Server {
            status,
            error: fields.error,
            message: fields
                .message
                .or(fields.description)
                .unwrap_or_else(|| format!("Server error (HTTP {})", status)),
        },
        _ => ApiError::Validation {
            status: Some(status),
            error: fields.error,
            message: fields
                .message
                .or(fields.description)
                .or(fields.text)
                .unwrap_or_else(|| format!("Request rejected (HTTP {})", status)),
            details: body,
        },
    }
}

/// Read the retry hint from the `Retry-After` header, else the body
pub fn retry_after_hint(response: &ResponseEnvelope, body: Option<&Value>) -> Option<Duration> {
    if let Some(delay) = response.header("retry-after").and_then(parse_retry_after) {
        return Some(delay);
    }

    let value = body?.get("retry_after").or_else(|| body?.get("retryAfter"))?;
    match value {
        Value::Number(n) => n
            .as_f64()
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok()),
        Value::String(s) => parse_retry_after(s),
        _ => None,
    }
}

/// Fields pulled out of an error body
struct ErrorFields {
    error: String,
    message: Option<String>,
    description: Option<String>,
    /// Raw body text when the body is not JSON
    text: Option<String>,
}

impl ErrorFields {
    fn extract(body: Option<&Value>, response: &ResponseEnvelope) -> Self {
        let string_field = |name: &str| {
            body.and_then(|b| b.get(name))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let text = if body.is_none() {
            let text = response.text();
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        } else {
            None
        };

        Self {
            error: string_field("error").unwrap_or_else(|| {
                if body.is_none() && text.is_some() {
                    "invalid_response".to_string()
                } else {
                    "unknown_error".to_string()
                }
            }),
            message: string_field("message"),
            description: string_field("error_description"),
            text,
        }
    }
}
