//! Transport layer
//!
//! This module defines the request/response types shared by every call and the
//! [`Transport`] seam that performs exactly one HTTP exchange. The transport
//! does not interpret status codes, retry, or refresh tokens; the
//! [`RequestPipeline`](crate::pipeline::RequestPipeline) does that on top.

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{ApiError, Result};

// =============================================================================
// Request Types
// =============================================================================

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET request
    Get,
    /// POST request
    Post,
    /// PUT request
    Put,
    /// PATCH request
    Patch,
    /// DELETE request
    Delete,
}

impl HttpMethod {
    /// Method name as sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// A file attached to a multipart body
#[derive(Clone, PartialEq, Eq)]
pub struct FilePart {
    /// Form field name
    pub field: String,
    /// File name reported to the server
    pub file_name: String,
    /// MIME type of the bytes
    pub content_type: String,
    /// Raw file contents
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for FilePart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilePart")
            .field("field", &self.field)
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A `multipart/form-data` body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartBody {
    /// Plain text fields
    pub fields: Vec<(String, String)>,
    /// Optional file part
    pub file: Option<FilePart>,
}

impl MultipartBody {
    /// Add a text field
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Attach a file
    pub fn file(mut self, file: FilePart) -> Self {
        self.file = Some(file);
        self
    }
}

/// Request payload
#[derive(Clone, PartialEq)]
pub enum RequestBody {
    /// JSON document
    Json(serde_json::Value),
    /// Multipart form (media upload)
    Multipart(MultipartBody),
}

// Only top-level keys are printed: token exchange and service bodies carry secrets.
impl std::fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestBody::Json(serde_json::Value::Object(map)) => f
                .debug_tuple("Json")
                .field(&map.keys().collect::<Vec<_>>())
                .finish(),
            RequestBody::Json(_) => f.write_str("Json(..)"),
            RequestBody::Multipart(body) => f.debug_tuple("Multipart").field(body).finish(),
        }
    }
}

/// Description of a single logical API call
///
/// Built per call and never mutated once handed to the pipeline; the bearer
/// token is supplied separately for each attempt.
///
/// # Examples
/// ```
/// use imagine_client::transport::{HttpMethod, RequestSpec};
///
/// let spec = RequestSpec::get("/api/feed").param("limit", "20");
/// assert_eq!(spec.method, HttpMethod::Get);
/// assert!(spec.requires_auth);
/// assert_eq!(spec.query.get("limit"), Some(&"20".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    /// HTTP method
    pub method: HttpMethod,
    /// Path relative to the base URL (e.g. "/api/posts")
    pub path: String,
    /// Query parameters
    pub query: HashMap<String, String>,
    /// Optional payload
    pub body: Option<RequestBody>,
    /// Whether a bearer token must be attached
    pub requires_auth: bool,
}

impl RequestSpec {
    /// Create a request with the given method and path
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: HashMap::new(),
            body: None,
            requires_auth: true,
        }
    }

    /// Create a GET request
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Create a POST request
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Create a PUT request
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    /// Create a PATCH request
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    /// Create a DELETE request
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Set a JSON body
    pub fn json<T: Serialize>(mut self, value: &T) -> Result<Self> {
        let value = serde_json::to_value(value)
            .map_err(|e| ApiError::invalid_input("invalid_body", e.to_string()))?;
        self.body = Some(RequestBody::Json(value));
        Ok(self)
    }

    /// Set a multipart body
    pub fn multipart(mut self, body: MultipartBody) -> Self {
        self.body = Some(RequestBody::Multipart(body));
        self
    }

    /// Send without an `Authorization` header
    pub fn unauthenticated(mut self) -> Self {
        self.requires_auth = false;
        self
    }
}

/// One attempt of a [`RequestSpec`], as handed to a [`Transport`]
#[derive(Clone, PartialEq)]
pub struct PreparedRequest {
    /// The logical request
    pub spec: RequestSpec,
    /// Access token to send as `Authorization: Bearer`
    pub bearer: Option<String>,
    /// Upper bound for this exchange
    pub timeout: Duration,
}

impl std::fmt::Debug for PreparedRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedRequest")
            .field("method", &self.spec.method)
            .field("path", &self.spec.path)
            .field("bearer", &self.bearer.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// Raw HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseEnvelope {
    /// HTTP status code
    pub status: u16,
    /// Response headers, names lower-cased
    pub headers: HashMap<String, String>,
    /// Raw body bytes
    pub body: Vec<u8>,
}

impl ResponseEnvelope {
    /// Create a new response
    pub fn new(status: u16, headers: HashMap<String, String>, body: Vec<u8>) -> Self {
        Self {
            status,
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v))
                .collect(),
            body,
        }
    }

    /// Create a response with a JSON body and no headers
    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status, HashMap::new(), value.to_string().into_bytes())
    }

    /// Get a header value (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Check if the response is successful (2xx status)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON, if it is JSON
    pub fn json_value(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }

    /// Body as lossy UTF-8 text
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body into `T`
    ///
    /// An empty body decodes as `{}` so endpoints answering 204 can still be
    /// read into structs whose fields all have defaults.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let body: &[u8] = if self.body.iter().all(u8::is_ascii_whitespace) {
            b"{}"
        } else {
            &self.body
        };

        serde_json::from_slice(body).map_err(|e| ApiError::Server {
            status: self.status,
            error: "invalid_response".to_string(),
            message: format!("Failed to parse response body: {}", e),
        })
    }
}

// =============================================================================
// Transport
// =============================================================================

/// Performs a single HTTP exchange
///
/// Implementations must not retry and must not interpret status codes: any
/// response, 2xx or not, is returned as a [`ResponseEnvelope`]. Only a failure
/// to obtain a response (connect error, timeout, truncated body) is an error,
/// and it is always [`ApiError::Network`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and capture the response
    async fn send(&self, request: &PreparedRequest) -> Result<ResponseEnvelope>;
}

/// [`Transport`] backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// HTTP client
    client: ReqwestClient,
    /// Base URL without trailing slash
    base_url: String,
}

impl HttpTransport {
    /// Create a transport for the given base URL
    pub fn new(base_url: impl Into<String>, user_agent: &str) -> Result<Self> {
        let client = ReqwestClient::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| ApiError::network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client, base_url))
    }

    /// Create a transport around an existing `reqwest` client
    pub fn with_client(client: ReqwestClient, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &PreparedRequest) -> Result<ResponseEnvelope> {
        let spec = &request.spec;
        let url = self.url(&spec.path);

        let mut req = match spec.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Put => self.client.put(&url),
            HttpMethod::Patch => self.client.patch(&url),
            HttpMethod::Delete => self.client.delete(&url),
        };

        req = req
            .timeout(request.timeout)
            .header(reqwest::header::ACCEPT, "application/json");

        if !spec.query.is_empty() {
            req = req.query(&spec.query);
        }

        if let Some(token) = &request.bearer {
            req = req.bearer_auth(token);
        }

        match &spec.body {
            Some(RequestBody::Json(value)) => {
                req = req.json(value);
            }
            Some(RequestBody::Multipart(body)) => {
                req = req.multipart(build_form(body)?);
            }
            None => {}
        }

        let response = req.send().await.map_err(|e| describe_failure(&e, request))?;

        let status = response.status().as_u16();
        let mut headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(value_str) = value.to_str() {
                headers.insert(key.as_str().to_string(), value_str.to_string());
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| describe_failure(&e, request))?;

        Ok(ResponseEnvelope::new(status, headers, body.to_vec()))
    }
}

fn build_form(body: &MultipartBody) -> Result<reqwest::multipart::Form> {
    let mut form = reqwest::multipart::Form::new();
    for (name, value) in &body.fields {
        form = form.text(name.clone(), value.clone());
    }

    if let Some(file) = &body.file {
        let part = reqwest::multipart::Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| ApiError::invalid_input("invalid_content_type", e.to_string()))?;
        form = form.part(file.field.clone(), part);
    }

    Ok(form)
}

fn describe_failure(error: &reqwest::Error, request: &PreparedRequest) -> ApiError {
    let what = format!("{} {}", request.spec.method.as_str(), request.spec.path);
    if error.is_timeout() {
        ApiError::network(format!(
            "{} timed out after {:?}",
            what, request.timeout
        ))
    } else if error.is_connect() {
        ApiError::network(format!("{} could not connect: {}", what, error))
    } else {
        ApiError::network(format!("{} failed: {}", what, error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_request_builders() {
        let spec = RequestSpec::post("/api/posts")
            .json(&serde_json::json!({"content": "hi"}))
            .unwrap();

        assert_eq!(spec.method, HttpMethod::Post);
        assert_eq!(spec.path, "/api/posts");
        assert!(spec.requires_auth);
        assert_eq!(
            spec.body,
            Some(RequestBody::Json(serde_json::json!({"content": "hi"})))
        );

        let token = RequestSpec::post("/api/auth/token").unauthenticated();
        assert!(!token.requires_auth);
    }

    #[test]
    fn test_http_method_as_str() {
        assert_eq!(HttpMethod::Get.as_str(), "GET");
        assert_eq!(HttpMethod::Post.as_str(), "POST");
        assert_eq!(HttpMethod::Put.as_str(), "PUT");
        assert_eq!(HttpMethod::Patch.as_str(), "PATCH");
        assert_eq!(HttpMethod::Delete.as_str(), "DELETE");
    }

    #[test]
    fn test_response_header_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert("Retry-After".to_string(), "5".to_string());
        let response = ResponseEnvelope::new(429, headers, Vec::new());

        assert_eq!(response.header("retry-after"), Some("5"));
        assert_eq!(response.header("RETRY-AFTER"), Some("5"));
        assert!(!response.is_success());
    }

    #[test]
    fn test_decode_empty_body() {
        #[derive(Deserialize, Default)]
        struct Flags {
            #[serde(default)]
            liked: bool,
        }

        let response = ResponseEnvelope::new(204, HashMap::new(), Vec::new());
        let flags: Flags = response.decode().unwrap();
        assert!(!flags.liked);
    }

    #[test]
    fn test_decode_malformed_body_is_server_error() {
        let response = ResponseEnvelope::new(200, HashMap::new(), b"<html>".to_vec());
        let err = response.decode::<serde_json::Value>().unwrap_err();
        assert!(matches!(err, ApiError::Server { status: 200, .. }));
    }

    #[test]
    fn test_prepared_request_debug_redacts_bearer() {
        let prepared = PreparedRequest {
            spec: RequestSpec::get("/api/feed"),
            bearer: Some("iat_secret_value".to_string()),
            timeout: Duration::from_secs(30),
        };
        let debug = format!("{:?}", prepared);
        assert!(!debug.contains("iat_secret_value"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_http_transport_trims_base_url() {
        let transport = HttpTransport::new("https://example.com/", "test/1.0").unwrap();
        assert_eq!(transport.base_url(), "https://example.com");
        assert_eq!(transport.url("/api/feed"), "https://example.com/api/feed");
    }
}
