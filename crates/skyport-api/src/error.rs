use thiserror::Error;

/// Top-level error type for the `skyport-api` crate.
///
/// Surfaces raw upstream outcomes. No retry or backoff decisions are made
/// here; `skyport-core` maps these into cycle-level diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Credentials rejected by the token endpoint (HTTP 400/401/403).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Rate limiting ───────────────────────────────────────────────
    /// HTTP 429. Includes the vendor's recommended backoff in seconds.
    #[error("Rate limited -- retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    // ── Upstream ────────────────────────────────────────────────────
    /// Any other non-2xx response.
    #[error("Skyport API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Building the HTTP client failed.
    #[error("HTTP client setup failed: {0}")]
    Client(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed. The message carries a body preview.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String },
}

