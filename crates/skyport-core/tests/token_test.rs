#![allow(clippy::unwrap_used)]
// Token lifecycle tests against a wiremock token endpoint.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use skyport_api::{Credentials, SkyportClient, TransportConfig};
use skyport_core::{CoreError, TokenManager};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, TokenManager) {
    let server = MockServer::start().await;
    let credentials = Credentials::new("api-key", "integrator-token", "owner@example.com");
    let client = SkyportClient::new(
        &server.uri(),
        &credentials.api_key,
        &TransportConfig::default(),
    )
    .unwrap();
    let manager = TokenManager::new(Arc::new(client), credentials, Duration::from_secs(60));
    (server, manager)
}

fn token_body(token: &str, expires_in: u64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "accessToken": token,
        "accessTokenExpiresIn": expires_in,
        "tokenType": "Bearer"
    }))
}

// ── Caching ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_token_reused_until_expiry() {
    let (server, manager) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/token"))
        .respond_with(token_body("token-1", 900))
        .expect(1)
        .mount(&server)
        .await;

    for _ in 0..3 {
        let token = manager.valid_token().await.unwrap();
        assert_eq!(token.expose(), "token-1");
    }
    assert_eq!(manager.mint_count().await, 1);
}

#[tokio::test]
async fn test_expired_token_is_replaced() {
    let (server, manager) = setup().await;

    // A 1s lifetime leaves 0.5s of usable time once the margin is capped.
    Mock::given(method("POST"))
        .and(path("/v1/token"))
        .respond_with(token_body("token-1", 1))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/token"))
        .respond_with(token_body("token-2", 900))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(manager.valid_token().await.unwrap().expose(), "token-1");
    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(manager.valid_token().await.unwrap().expose(), "token-2");
    assert_eq!(manager.valid_token().await.unwrap().expose(), "token-2");
    assert_eq!(manager.mint_count().await, 2);
}

#[tokio::test]
async fn test_zero_lifetime_token_is_never_reused() {
    let (server, manager) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/token"))
        .respond_with(token_body("short", 0))
        .expect(2)
        .mount(&server)
        .await;

    manager.valid_token().await.unwrap();
    manager.valid_token().await.unwrap();
}

#[tokio::test]
async fn test_invalidate_forces_new_mint() {
    let (server, manager) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/token"))
        .respond_with(token_body("token", 900))
        .expect(2)
        .mount(&server)
        .await;

    manager.valid_token().await.unwrap();
    manager.invalidate().await;
    manager.valid_token().await.unwrap();
}

// ── Single-flight renewal ───────────────────────────────────────────

#[tokio::test]
async fn test_concurrent_callers_share_one_mint() {
    let (server, manager) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/token"))
        .respond_with(token_body("shared", 900).set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&server)
        .await;

    let results = join_all((0..10).map(|_| manager.valid_token())).await;

    assert_eq!(results.len(), 10);
    for result in results {
        assert_eq!(result.unwrap().expose(), "shared");
    }
    assert_eq!(manager.mint_count().await, 1);
}

#[tokio::test]
async fn test_concurrent_tasks_share_one_mint() {
    let (server, manager) = setup().await;
    let manager = Arc::new(manager);

    Mock::given(method("POST"))
        .and(path("/v1/token"))
        .respond_with(token_body("shared", 900).set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&server)
        .await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.valid_token().await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap().expose(), "shared");
    }
}

// ── Failures ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_rate_limit_blocks_next_mint() {
    let (server, manager) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/token"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/token"))
        .respond_with(token_body("after-backoff", 900))
        .expect(1)
        .mount(&server)
        .await;

    let first = manager.valid_token().await;
    assert!(
        matches!(first, Err(CoreError::RateLimited { retry_after }) if retry_after == Duration::from_secs(1)),
        "got: {first:?}"
    );

    // Still inside the backoff window: fails fast without a request.
    match manager.valid_token().await {
        Err(CoreError::RateLimited { retry_after }) => {
            assert!(retry_after <= Duration::from_secs(1));
        }
        other => panic!("expected RateLimited, got: {other:?}"),
    }

    tokio::time::sleep(Duration::from_millis(1_100)).await;
    assert_eq!(manager.valid_token().await.unwrap().expose(), "after-backoff");
}

#[tokio::test]
async fn test_rejected_credentials_propagate_without_retry() {
    let (server, manager) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/token"))
        .respond_with(ResponseTemplate::new(400))
        .expect(2)
        .mount(&server)
        .await;

    for _ in 0..2 {
        let result = manager.valid_token().await;
        assert!(
            matches!(result, Err(CoreError::AuthenticationFailed { .. })),
            "got: {result:?}"
        );
    }
    assert_eq!(manager.mint_count().await, 0);
}
