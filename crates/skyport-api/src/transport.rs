// Shared transport configuration for building the reqwest::Client.
//
// Timeout, user agent and the open-request cap live here so the
// client module only deals with endpoint mechanics.

use std::time::Duration;

use reqwest::header::HeaderMap;

use crate::error::Error;

/// The vendor allows at most this many simultaneously open HTTP requests.
pub const MAX_OPEN_REQUESTS: usize = 3;

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub max_open_requests: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_open_requests: MAX_OPEN_REQUESTS,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` with the given default headers.
    ///
    /// Used by [`SkyportClient`](crate::SkyportClient) to inject the
    /// `x-api-key` header on every request.
    pub fn build_client_with_headers(&self, headers: HeaderMap) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("skyport-exporter/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Client(format!("failed to build HTTP client: {e}")))
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
