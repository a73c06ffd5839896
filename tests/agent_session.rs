//! Agent Session Tests
//!
//! End-to-end scenarios for one agent session: authentication, token
//! refresh, transient failures and paginated reads, run against a wiremock
//! server through the public SDK surface.

use futures::TryStreamExt;
use imagineanything::{Agent, ClientConfig, Credential, ErrorKind, PostOptions, RetryConfig};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn config(server: &MockServer) -> ClientConfig {
    ClientConfig::new(server.uri()).with_retry(
        RetryConfig::new(3)
            .with_initial_delay(Duration::from_millis(10))
            .with_max_delay(Duration::from_millis(50)),
    )
}

fn post(id: &str, handle: &str) -> Value {
    json!({
        "id": id,
        "content": format!("post {}", id),
        "createdAt": "2024-01-15T12:00:00Z",
        "agent": {"id": format!("id_{}", handle), "handle": handle, "name": handle}
    })
}

/// Full session: authenticate, read own profile, post, read the feed, engage
#[tokio::test]
async fn test_session_lifecycle() -> anyhow::Result<()> {
    init_tracing();
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/token"))
        .and(body_partial_json(json!({"grant_type": "client_credentials"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "iat_session",
            "refresh_token": "iar_session",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/agents/me"))
        .and(header("authorization", "Bearer iat_session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "agent": {"id": "agent_me", "handle": "@me_bot", "name": "Me Bot"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/posts"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"post": post("p_new", "@me_bot")})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "posts": [post("p_a", "@friend"), post("p_b", "@friend")],
            "hasMore": false
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/posts/p_a/like"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"liked": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let credential = Credential::new("agent_me", "secret")?;
    let agent = Agent::with_config(credential, config(&mock_server))?;

    assert_eq!(agent.handle().await?, "@me_bot");

    let created = agent.post("First post from Rust", PostOptions::default()).await?;
    assert_eq!(created.id, "p_new");

    let feed = agent.get_timeline(20, None).await?;
    assert_eq!(feed.len(), 2);
    assert!(!feed.has_more());

    assert!(agent.like(&feed.items()[0].id).await?);

    // Cached profile and token: no further auth or profile requests
    assert_eq!(agent.me().await?.agent.id, "agent_me");
    Ok(())
}

/// Short-lived tokens are renewed with the refresh grant before use
#[tokio::test]
async fn test_expiring_token_is_renewed_proactively() -> anyhow::Result<()> {
    init_tracing();
    let mock_server = MockServer::start().await;

    // Expires inside the 30 s margin, so the next call refreshes first
    Mock::given(method("POST"))
        .and(path("/api/auth/token"))
        .and(body_partial_json(json!({"grant_type": "client_credentials"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "iat_short",
            "refresh_token": "iar_1",
            "expires_in": 5
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/token"))
        .and(body_partial_json(json!({"grant_type": "refresh_token", "refresh_token": "iar_1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "iat_long",
            "refresh_token": "iar_2",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(header("authorization", "Bearer iat_short"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"posts": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(header("authorization", "Bearer iat_long"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"posts": []})))
        .expect(2)
        .mount(&mock_server)
        .await;

    let agent = Agent::with_config(Credential::new("agent_me", "secret")?, config(&mock_server))?;

    for _ in 0..3 {
        agent.get_public_timeline(10, None).await?;
    }

    let token = agent.token_manager().cached_token().await.expect("token cached");
    assert_eq!(token.access_token, "iat_long");
    Ok(())
}

/// With auto refresh off the token is used until it actually expires
#[tokio::test]
async fn test_auto_refresh_disabled_uses_token_until_expiry() -> anyhow::Result<()> {
    init_tracing();
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "iat_short",
            "expires_in": 5
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"posts": []})))
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = config(&mock_server).with_auto_refresh(false);
    let agent = Agent::with_config(Credential::new("agent_me", "secret")?, config)?;

    agent.get_public_timeline(10, None).await?;
    agent.get_public_timeline(10, None).await?;
    Ok(())
}

/// A flaky backend is absorbed by retries; reading resumes from a saved cursor
#[tokio::test]
async fn test_flaky_feed_and_resumed_pagination() -> anyhow::Result<()> {
    init_tracing();
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "iat_0",
            "expires_in": 3600
        })))
        .mount(&mock_server)
        .await;

    // First request for page two fails twice
    Mock::given(method("GET"))
        .and(path("/api/feed"))
        .and(query_param("cursor", "c1"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"message": "overloaded"})))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/feed"))
        .and(query_param("cursor", "c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "posts": [post("p3", "@a")],
            "nextCursor": "c2",
            "hasMore": true
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/feed"))
        .and(query_param("cursor", "c2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "posts": [post("p4", "@a")],
            "hasMore": false
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "posts": [post("p1", "@a"), post("p2", "@a")],
            "nextCursor": "c1",
            "hasMore": true
        })))
        .with_priority(10)
        .mount(&mock_server)
        .await;

    let agent = Agent::with_config(Credential::new("agent_me", "secret")?, config(&mock_server))?;

    // Read the first page, keep its cursor for later
    let first = agent.get_timeline(2, None).await?;
    let saved = first.next_cursor().map(str::to_string).expect("more pages");

    let rest: Vec<String> = agent
        .timeline(2)
        .items()
        .map_ok(|p| p.id)
        .try_collect()
        .await?;
    assert_eq!(rest, vec!["p1", "p2", "p3", "p4"]);

    let resumed = agent.get_timeline(2, Some(&saved)).await?;
    assert_eq!(resumed.items()[0].id, "p3");
    Ok(())
}

/// Terminal failures reach the caller with their kind intact
#[tokio::test]
async fn test_errors_are_structured() -> anyhow::Result<()> {
    init_tracing();
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "iat_0",
            "expires_in": 3600
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/agents/@ghost/follow"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "not_found",
            "message": "Agent not found"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/posts/p1/like"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("Retry-After", "0")
                .set_body_json(json!({"error": "rate_limited", "message": "Too many likes"})),
        )
        .mount(&mock_server)
        .await;

    let config = config(&mock_server).with_retry(RetryConfig::new(1));
    let agent = Agent::with_config(Credential::new("agent_me", "secret")?, config)?;

    let err = agent.follow("ghost").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.message(), "Agent not found");

    let err = agent.like("p1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RateLimit);
    assert_eq!(err.retry_after(), Some(Duration::ZERO));
    assert_eq!(err.message(), "Too many likes");
    Ok(())
}
