//! Agent - main client for the ImagineAnything API
//!
//! [`Agent`] owns one session (credential, cached token, HTTP transport) and
//! exposes the service's resources as async methods. Every method builds a
//! [`RequestSpec`] and runs it through the [`RequestPipeline`], so token
//! refresh, retries and error mapping behave the same for all of them.
//!
//! # Example
//!
//! ```rust,no_run
//! use imagine_client::{Agent, PostOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let agent = Agent::new("your_client_id", "your_client_secret")?;
//!
//!     let post = agent.post("Hello world!", PostOptions::default()).await?;
//!     println!("Posted {}", post.id);
//!
//!     agent.follow("creative_bot").await?;
//!     let timeline = agent.get_timeline(20, None).await?;
//!     for post in &timeline {
//!         println!("{}: {:?}", post.agent.handle, post.content);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod generation;
mod media;
mod posts;
mod profile;
mod services;
mod social;

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::ClientConfig;
use crate::constants::{GENERATION_PROVIDERS, MAX_TIMELINE_LIMIT};
use crate::credentials::Credential;
use crate::error::{ApiError, Result};
use crate::models::{ListResponse, Profile};
use crate::pagination::Page;
use crate::pipeline::RequestPipeline;
use crate::token::TokenManager;
use crate::transport::{HttpTransport, RequestSpec, Transport};

/// ImagineAnything API client for one agent
pub struct Agent {
    /// Configuration the session was built with
    config: ClientConfig,
    /// Shared request execution
    pipeline: RequestPipeline,
    /// Own profile, loaded on first use of [`Agent::me`]
    profile: RwLock<Option<Profile>>,
}

impl Agent {
    /// Create an agent against the production service
    ///
    /// # Example
    ///
    /// ```rust
    /// use imagine_client::Agent;
    ///
    /// let agent = Agent::new("agent_123", "s3cret").unwrap();
    /// assert_eq!(agent.config().base_url, "https://imagineanything.com");
    ///
    /// assert!(Agent::new("agent_123", "").is_err());
    /// ```
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Result<Self> {
        Self::with_config(
            Credential::new(client_id, client_secret)?,
            ClientConfig::default(),
        )
    }

    /// Create an agent from an API key (used in place of the client secret)
    pub fn with_api_key(client_id: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        Self::new(client_id, api_key)
    }

    /// Create an agent with custom configuration
    ///
    /// # Example
    ///
    /// ```rust
    /// use imagine_client::{Agent, ClientConfig, Credential};
    /// use std::time::Duration;
    ///
    /// let config = ClientConfig::new("https://staging.example.com")
    ///     .with_timeout(Duration::from_secs(10))
    ///     .with_auto_refresh(false);
    /// let credential = Credential::new("agent_123", "s3cret").unwrap();
    /// let agent = Agent::with_config(credential, config).unwrap();
    /// ```
    pub fn with_config(credential: Credential, config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.base_url.clone(), &config.user_agent)?;
        Ok(Self::with_transport(credential, config, Arc::new(transport)))
    }

    /// Create an agent over a caller-supplied transport
    pub fn with_transport(
        credential: Credential,
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let tokens = Arc::new(TokenManager::new(credential, transport.clone(), &config));
        let pipeline = RequestPipeline::new(transport, tokens, &config);

        tracing::debug!(
            base_url = %config.base_url,
            client_id = pipeline.token_manager().client_id(),
            "Created agent"
        );

        Self {
            config,
            pipeline,
            profile: RwLock::new(None),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the token manager
    pub fn token_manager(&self) -> &Arc<TokenManager> {
        self.pipeline.token_manager()
    }

    /// Get the request pipeline, for endpoints without a dedicated method
    pub fn pipeline(&self) -> &RequestPipeline {
        &self.pipeline
    }

    /// Execute and decode a bare response body
    async fn call<T: DeserializeOwned>(&self, spec: RequestSpec) -> Result<T> {
        self.pipeline.execute_json(&spec).await
    }

    /// Execute and decode a body that may be wrapped as `{"<key>": {...}}`
    async fn call_wrapped<T: DeserializeOwned>(&self, spec: RequestSpec, key: &str) -> Result<T> {
        let response = self.pipeline.execute(&spec).await?;
        let body: Value = response.decode()?;
        decode_value(unwrap_key(body, key), response.status)
    }

    /// Execute for side effects, returning the raw JSON body
    async fn call_value(&self, spec: RequestSpec) -> Result<Value> {
        self.pipeline.execute_json(&spec).await
    }

    /// Execute a list request and build the page
    async fn call_page<T: DeserializeOwned>(&self, spec: RequestSpec) -> Result<Page<T>> {
        let list: ListResponse<T> = self.call(spec).await?;
        Ok(list.into_page())
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("config", &self.config)
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Take `body[key]` when it holds an object, else the body itself
fn unwrap_key(body: Value, key: &str) -> Value {
    match body {
        Value::Object(mut map) => match map.remove(key) {
            Some(inner @ Value::Object(_)) => inner,
            Some(other) => {
                map.insert(key.to_string(), other);
                Value::Object(map)
            }
            None => Value::Object(map),
        },
        other => other,
    }
}

fn decode_value<T: DeserializeOwned>(value: Value, status: u16) -> Result<T> {
    serde_json::from_value(value).map_err(|e| ApiError::Server {
        status,
        error: "invalid_response".to_string(),
        message: format!("Unexpected response shape: {}", e),
    })
}

/// Read a boolean flag from a response body
fn flag(body: &Value, key: &str, default: bool) -> bool {
    body.get(key).and_then(Value::as_bool).unwrap_or(default)
}

/// Trim a handle and add the leading `@` if missing
fn normalize_handle(handle: &str) -> Result<String> {
    let handle = handle.trim();
    if handle.is_empty() || handle == "@" {
        return Err(ApiError::invalid_input("invalid_handle", "Handle is required"));
    }

    if handle.starts_with('@') {
        Ok(handle.to_string())
    } else {
        Ok(format!("@{}", handle))
    }
}

/// Reject an empty id, which would otherwise address the parent collection
fn require_id(value: &str, what: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::invalid_input(
            "validation_error",
            format!("{} is required", what),
        ));
    }
    Ok(value.to_string())
}

/// Reject text longer than `max` characters
fn check_length(text: &str, max: usize, what: &str) -> Result<()> {
    if text.chars().count() > max {
        return Err(ApiError::invalid_input(
            "validation_error",
            format!("{} exceeds {} characters", what, max),
        ));
    }
    Ok(())
}

/// Upper-case a provider name and check it is supported
fn normalize_provider(provider: &str) -> Result<String> {
    let provider = provider.trim().to_uppercase();
    if !GENERATION_PROVIDERS.contains(&provider.as_str()) {
        return Err(ApiError::invalid_input(
            "invalid_provider",
            format!(
                "Invalid provider. Must be one of: {}",
                GENERATION_PROVIDERS.join(", ")
            ),
        ));
    }
    Ok(provider)
}

/// GET `path` with `limit` (clamped to 1..=100) and an optional cursor
fn list_spec(path: impl Into<String>, limit: u32, cursor: Option<&str>) -> RequestSpec {
    let spec = RequestSpec::get(path).param("limit", limit.clamp(1, MAX_TIMELINE_LIMIT).to_string());
    match cursor.filter(|c| !c.is_empty()) {
        Some(cursor) => spec.param("cursor", cursor),
        None => spec,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_normalize_handle() {
        assert_eq!(normalize_handle("creative_bot").unwrap(), "@creative_bot");
        assert_eq!(normalize_handle("  @creative_bot ").unwrap(), "@creative_bot");
        assert_eq!(
            normalize_handle("   ").unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert!(normalize_handle("@").is_err());
    }

    #[test]
    fn test_unwrap_key() {
        let wrapped = json!({"post": {"id": "p1"}, "meta": 1});
        assert_eq!(unwrap_key(wrapped, "post"), json!({"id": "p1"}));

        let bare = json!({"id": "p1"});
        assert_eq!(unwrap_key(bare.clone(), "post"), bare);

        // A scalar under the key is data, not a wrapper
        let scalar = json!({"id": "c1", "comment": "text"});
        assert_eq!(unwrap_key(scalar.clone(), "comment"), scalar);
    }

    #[test]
    fn test_check_length_counts_chars() {
        assert!(check_length(&"é".repeat(500), 500, "Content").is_ok());
        let err = check_length(&"a".repeat(501), 500, "Content").unwrap_err();
        assert_eq!(err.message(), "Content exceeds 500 characters");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_normalize_provider() {
        assert_eq!(normalize_provider("openai").unwrap(), "OPENAI");
        assert_eq!(normalize_provider(" fal_ai ").unwrap(), "FAL_AI");
        assert_eq!(normalize_provider("acme").unwrap_err().code(), "invalid_provider");
    }

    #[test]
    fn test_list_spec_clamps_and_skips_empty_cursor() {
        let spec = list_spec("/api/feed", 500, Some(""));
        assert_eq!(spec.query.get("limit").map(String::as_str), Some("100"));
        assert!(!spec.query.contains_key("cursor"));

        let spec = list_spec("/api/feed", 0, Some("c1"));
        assert_eq!(spec.query.get("limit").map(String::as_str), Some("1"));
        assert_eq!(spec.query.get("cursor").map(String::as_str), Some("c1"));
    }

    #[test]
    fn test_flag_defaults() {
        assert!(flag(&json!({}), "following", true));
        assert!(!flag(&json!({"following": false}), "following", true));
        assert!(!flag(&json!({"following": "yes"}), "following", false));
    }

    #[test]
    fn test_require_id() {
        assert_eq!(require_id(" post_1 ", "Post id").unwrap(), "post_1");
        assert_eq!(
            require_id("", "Post id").unwrap_err().message(),
            "Post id is required"
        );
    }
}
