// ── Runtime exporter configuration ──
//
// Describes *what* to poll and how often. Carries credential data but
// never touches disk or the environment; `skyport-config` builds it.

use std::time::Duration;

use skyport_api::Credentials;
pub use skyport_api::client::DEFAULT_BASE_URL;
use skyport_api::transport::TransportConfig;

/// The vendor asks integrators not to poll more often than every 3 minutes.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(180);

/// Subtracted from the server-declared token lifetime.
pub const DEFAULT_TOKEN_MARGIN: Duration = Duration::from_secs(60);

pub const DEFAULT_THERMOSTAT: &str = "Downstairs";

/// Configuration for polling a single thermostat.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    /// API key, integrator token and account email.
    pub credentials: Credentials,
    /// Display name of the thermostat to export (matched case-insensitively).
    pub thermostat: String,
    /// Integrator API base URL.
    pub base_url: String,
    /// Per-request transport timeout.
    pub timeout: Duration,
    /// Delay between the end of one polling cycle and the start of the next.
    pub poll_interval: Duration,
    /// Safety margin subtracted from each token's declared lifetime.
    pub token_margin: Duration,
}

impl ExporterConfig {
    /// Config with vendor defaults for everything but the credentials.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            thermostat: DEFAULT_THERMOSTAT.into(),
            base_url: DEFAULT_BASE_URL.into(),
            timeout: Duration::from_secs(30),
            poll_interval: MIN_POLL_INTERVAL,
            token_margin: DEFAULT_TOKEN_MARGIN,
        }
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig::default().with_timeout(self.timeout)
    }
}
