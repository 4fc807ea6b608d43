// Async HTTP client for the Daikin Skyport integrator API.
//
// Base path: /v1/
// Auth: x-api-key header on every call, bearer token on device calls

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tracing::debug;
use url::Url;

use crate::auth::{AccessToken, Credentials, TokenGrant};
use crate::error::Error;
use crate::models::{DeviceRecord, DeviceSummary, Location, TokenRequest, TokenResponse};
use crate::transport::TransportConfig;

/// Production endpoint of the integrator API.
pub const DEFAULT_BASE_URL: &str = "https://integrator-api.daikinskyport.com";

/// Backoff applied when a 429 arrives without a usable `Retry-After`.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 300;

const BODY_PREVIEW_CHARS: usize = 200;

// ── Error response shape ─────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
}

/// A fully read response: status, backoff hint and body text.
struct Reply {
    status: StatusCode,
    retry_after: Option<u64>,
    body: String,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the Skyport integrator API.
///
/// Every operation is a single round trip with no retries. At most
/// [`TransportConfig::max_open_requests`] requests are in flight at once,
/// regardless of how many tasks share the client.
pub struct SkyportClient {
    http: reqwest::Client,
    base_url: Url,
    permits: Semaphore,
    timeout: Duration,
}

impl SkyportClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from the integrator API key and a transport config.
    ///
    /// Injects `x-api-key` as a default header on every request.
    pub fn new(
        base_url: &str,
        api_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut key_value =
            HeaderValue::from_str(api_key.expose_secret())
                .map_err(|e| Error::Client(format!("API key is not a valid header value: {e}")))?;
        key_value.set_sensitive(true);
        headers.insert("x-api-key", key_value);

        let http = transport.build_client_with_headers(headers)?;
        Ok(Self::with_client(http, Self::normalize_base_url(base_url)?, transport))
    }

    /// Wrap an existing `reqwest::Client` (caller manages the API key header).
    pub fn with_client(http: reqwest::Client, base_url: Url, transport: &TransportConfig) -> Self {
        Self {
            http,
            base_url,
            permits: Semaphore::new(transport.max_open_requests.max(1)),
            timeout: transport.timeout,
        }
    }

    /// Ensure the base URL ends with `/` so relative joins keep its path.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Exchange the integrator credentials for a bearer token.
    ///
    /// `POST /v1/token`. HTTP 400/401/403 mean the credentials were
    /// rejected; HTTP 429 carries the vendor's backoff.
    pub async fn mint_token(&self, credentials: &Credentials) -> Result<TokenGrant, Error> {
        let url = self.url("v1/token")?;
        debug!("POST {url}");

        let body = TokenRequest {
            email: credentials.email.expose_secret(),
            integrator_token: credentials.integrator_token.expose_secret(),
        };
        let reply = self.execute(self.http.post(url).json(&body)).await?;

        match reply.status {
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(Error::Authentication {
                    message: format!(
                        "token request rejected (HTTP {}): {}",
                        reply.status,
                        error_message(&reply)
                    ),
                })
            }
            status if status.is_success() => {
                let token: TokenResponse = decode(&reply)?;
                Ok(TokenGrant {
                    access_token: AccessToken::new(token.access_token),
                    expires_in: Duration::from_secs(token.access_token_expires_in),
                })
            }
            _ => Err(upstream_error(&reply)),
        }
    }

    /// List every thermostat on the account, across all locations.
    ///
    /// `GET /v1/devices/`. Location grouping is flattened; order is kept.
    pub async fn list_devices(&self, token: &AccessToken) -> Result<Vec<DeviceSummary>, Error> {
        let url = self.url("v1/devices/")?;
        debug!("GET {url}");

        let reply = self
            .execute(self.http.get(url).bearer_auth(token.expose()))
            .await?;
        if !reply.status.is_success() {
            return Err(upstream_error(&reply));
        }

        let locations: Vec<Location> = decode(&reply)?;
        Ok(locations.into_iter().flat_map(|l| l.devices).collect())
    }

    /// Fetch the full record of one thermostat.
    ///
    /// `GET /v1/devices/{device_id}`.
    pub async fn fetch_device(
        &self,
        token: &AccessToken,
        device_id: &str,
    ) -> Result<DeviceRecord, Error> {
        let mut url = self.url("v1/devices/")?;
        url.path_segments_mut()
            .map_err(|()| Error::Client(format!("base URL cannot carry a path: {}", self.base_url)))?
            .pop_if_empty()
            .push(device_id);
        debug!("GET {url}");

        let reply = self
            .execute(self.http.get(url).bearer_auth(token.expose()))
            .await?;
        if !reply.status.is_success() {
            return Err(upstream_error(&reply));
        }

        decode(&reply)
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    /// Send a request while holding one of the open-request permits.
    ///
    /// The permit is held until the body has been read in full.
    async fn execute(&self, builder: reqwest::RequestBuilder) -> Result<Reply, Error> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| Error::Client("request limiter closed".into()))?;

        let resp = builder.send().await.map_err(|e| self.transport_error(e))?;
        let status = resp.status();
        let retry_after = retry_after_secs(resp.headers());
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;

        Ok(Reply {
            status,
            retry_after,
            body,
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::Transport(err)
        }
    }
}

// ── Response handling ────────────────────────────────────────────────

fn decode<T: DeserializeOwned>(reply: &Reply) -> Result<T, Error> {
    serde_json::from_str(&reply.body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(&reply.body)),
    })
}

fn upstream_error(reply: &Reply) -> Error {
    if reply.status == StatusCode::TOO_MANY_REQUESTS {
        return Error::RateLimited {
            retry_after_secs: reply.retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        };
    }
    Error::Api {
        status: reply.status.as_u16(),
        message: error_message(reply),
    }
}

fn error_message(reply: &Reply) -> String {
    if let Ok(ErrorResponse {
        message: Some(message),
    }) = serde_json::from_str::<ErrorResponse>(&reply.body)
    {
        return message;
    }
    if reply.body.trim().is_empty() {
        reply.status.to_string()
    } else {
        preview(&reply.body)
    }
}

/// `Retry-After` in delta-seconds form. HTTP-date values are ignored.
fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}
