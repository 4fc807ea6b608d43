#![allow(clippy::unwrap_used)]
// Integration tests for `SkyportClient` using wiremock.

use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use skyport_api::{AccessToken, Credentials, Error, SkyportClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, SkyportClient) {
    let server = MockServer::start().await;
    let api_key: secrecy::SecretString = "test-api-key".to_string().into();
    let client = SkyportClient::new(&server.uri(), &api_key, &TransportConfig::default()).unwrap();
    (server, client)
}

fn credentials() -> Credentials {
    Credentials::new("test-api-key", "integrator-token", "owner@example.com")
}

fn token() -> AccessToken {
    AccessToken::new("bearer-abc")
}

// ── Token tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_mint_token_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/token"))
        .and(header("x-api-key", "test-api-key"))
        .and(body_json(json!({
            "email": "owner@example.com",
            "integratorToken": "integrator-token"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "bearer-abc",
            "accessTokenExpiresIn": 900,
            "tokenType": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let grant = client.mint_token(&credentials()).await.unwrap();

    assert_eq!(grant.access_token.expose(), "bearer-abc");
    assert_eq!(grant.expires_in, Duration::from_secs(900));
}

#[tokio::test]
async fn test_mint_token_bad_credentials() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/token"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "message": "Invalid integrator token" })),
        )
        .mount(&server)
        .await;

    let result = client.mint_token(&credentials()).await;

    match result {
        Err(Error::Authentication { ref message }) => {
            assert!(
                message.contains("Invalid integrator token"),
                "expected vendor message, got: {message}"
            );
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_mint_token_rate_limited() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/token"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "300"))
        .mount(&server)
        .await;

    let result = client.mint_token(&credentials()).await;

    assert!(
        matches!(result, Err(Error::RateLimited { retry_after_secs: 300 })),
        "expected RateLimited(300), got: {result:?}"
    );
}

#[tokio::test]
async fn test_mint_token_server_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/token"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let result = client.mint_token(&credentials()).await;

    match result {
        Err(Error::Api { status, ref message }) => {
            assert_eq!(status, 503);
            assert_eq!(message, "maintenance");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

// ── Device tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_devices_flattens_locations() {
    let (server, client) = setup().await;

    let body = json!([
        {
            "locationName": "Home",
            "devices": [
                { "id": "dev-1", "name": "Downstairs", "model": "ONEPLUS", "firmwareVersion": "3.2.1" },
                { "id": "dev-2", "name": "Upstairs" }
            ]
        },
        {
            "locationName": "Cabin",
            "devices": [{ "id": "dev-3", "name": "Cabin" }]
        }
    ]);

    Mock::given(method("GET"))
        .and(path("/v1/devices/"))
        .and(header("authorization", "Bearer bearer-abc"))
        .and(header("x-api-key", "test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let devices = client.list_devices(&token()).await.unwrap();

    assert_eq!(devices.len(), 3);
    assert_eq!(devices[0].id, "dev-1");
    assert_eq!(devices[0].model.as_deref(), Some("ONEPLUS"));
    assert_eq!(devices[0].firmware_version.as_deref(), Some("3.2.1"));
    assert_eq!(devices[2].name, "Cabin");
    assert!(devices[1].matches_name("UPSTAIRS"));
}

#[tokio::test]
async fn test_list_devices_upstream_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/devices/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.list_devices(&token()).await.unwrap_err();

    assert!(matches!(err, Error::Api { status: 401, .. }), "got: {err:?}");
}

#[tokio::test]
async fn test_fetch_device() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/devices/dev-1"))
        .and(header("authorization", "Bearer bearer-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tempIndoor": 215,
            "fan": false,
            "mode": 1,
            "scheduleEnabled": true
        })))
        .mount(&server)
        .await;

    let record = client.fetch_device(&token(), "dev-1").await.unwrap();

    assert_eq!(record.len(), 4);
    assert_eq!(record.get("tempIndoor"), Some(&json!(215)));
    assert_eq!(record.get("fan"), Some(&json!(false)));
}

#[tokio::test]
async fn test_fetch_device_malformed_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/devices/dev-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client.fetch_device(&token(), "dev-1").await;

    match result {
        Err(Error::Deserialization { ref message }) => {
            assert!(message.contains("<html>oops</html>"), "got: {message}");
        }
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_base_url_with_path_prefix() {
    let server = MockServer::start().await;
    let base = Url::parse(&format!("{}/gateway/", server.uri())).unwrap();
    let client =
        SkyportClient::with_client(reqwest::Client::new(), base, &TransportConfig::default());

    Mock::given(method("GET"))
        .and(path("/gateway/v1/devices/dev%201"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "mode": 3 })))
        .mount(&server)
        .await;

    let record = client.fetch_device(&token(), "dev 1").await.unwrap();
    assert_eq!(record.get("mode"), Some(&json!(3)));
}
