// ── Core error types ──
//
// Cycle-level errors from skyport-core. Consumers see what went wrong in
// domain terms; the `From<skyport_api::Error>` impl folds transport
// details into these variants.

use std::time::Duration;

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Vendor errors ────────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Rate limited by vendor -- retry after {}s", .retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    #[error("Upstream error: {message}")]
    Upstream {
        message: String,
        /// HTTP status code (if the vendor answered at all).
        status: Option<u16>,
    },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("No thermostat named '{name}' on this account")]
    DeviceNotFound { name: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Short, stable identifier for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::AuthenticationFailed { .. } => "authentication",
            Self::RateLimited { .. } => "rate_limited",
            Self::Upstream { .. } => "upstream",
            Self::DeviceNotFound { .. } => "device_not_found",
            Self::Internal(_) => "internal",
        }
    }

    /// Errors that need an operator rather than another attempt.
    pub fn is_misconfiguration(&self) -> bool {
        matches!(
            self,
            Self::Config { .. } | Self::AuthenticationFailed { .. } | Self::DeviceNotFound { .. }
        )
    }

    /// The vendor rejected the bearer token on a data call.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Upstream { status: Some(401), .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<skyport_api::Error> for CoreError {
    fn from(err: skyport_api::Error) -> Self {
        match err {
            skyport_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            skyport_api::Error::RateLimited { retry_after_secs } => CoreError::RateLimited {
                retry_after: Duration::from_secs(retry_after_secs),
            },
            skyport_api::Error::Api { status, message } => CoreError::Upstream {
                message,
                status: Some(status),
            },
            skyport_api::Error::Transport(ref e) => CoreError::Upstream {
                message: e.to_string(),
                status: e.status().map(|s| s.as_u16()),
            },
            skyport_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            skyport_api::Error::Timeout { timeout_secs } => CoreError::Upstream {
                message: format!("request timed out after {timeout_secs}s"),
                status: None,
            },
            skyport_api::Error::Client(message) => CoreError::Internal(message),
            skyport_api::Error::Deserialization { message } => CoreError::Upstream {
                message: format!("unexpected response body: {message}"),
                status: None,
            },
        }
    }
}
