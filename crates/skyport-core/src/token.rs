// ── Access token lifecycle ──
//
// Caches the bearer token minted from the integrator credentials and
// renews it when absent or expired. The whole check-mint-store sequence
// runs under one async mutex: concurrent callers queue behind a single
// in-flight mint and then read the token it stored.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use skyport_api::{AccessToken, Credentials, SkyportClient};

use crate::error::CoreError;

/// Lower bound for the expiry safety margin.
const MIN_TOKEN_MARGIN: Duration = Duration::from_secs(1);

struct CachedToken {
    token: AccessToken,
    expires_at: Instant,
}

#[derive(Default)]
struct TokenState {
    cached: Option<CachedToken>,
    /// No mint request may be sent before this instant (vendor 429).
    blocked_until: Option<Instant>,
    mints: u64,
}

/// Owner of the one bearer token.
///
/// Hands out clones for a single call window only; callers come back
/// through [`valid_token()`](Self::valid_token) for every request so that
/// renewal stays in one place.
pub struct TokenManager {
    client: Arc<SkyportClient>,
    credentials: Credentials,
    safety_margin: Duration,
    state: Mutex<TokenState>,
}

impl TokenManager {
    pub fn new(client: Arc<SkyportClient>, credentials: Credentials, safety_margin: Duration) -> Self {
        Self {
            client,
            credentials,
            safety_margin: safety_margin.max(MIN_TOKEN_MARGIN),
            state: Mutex::new(TokenState::default()),
        }
    }

    /// Return a token that has not yet expired, minting one if needed.
    ///
    /// Mint failures propagate unchanged; nothing is retried here. After a
    /// rate-limit response every call fails fast with the remaining backoff
    /// until it has elapsed, without touching the network.
    pub async fn valid_token(&self) -> Result<AccessToken, CoreError> {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        if let Some(cached) = state.cached.as_ref().filter(|c| now < c.expires_at) {
            return Ok(cached.token.clone());
        }

        if let Some(until) = state.blocked_until {
            if now < until {
                let retry_after = until - now;
                debug!(
                    retry_after_secs = retry_after.as_secs(),
                    "token mint suppressed during rate-limit backoff"
                );
                return Err(CoreError::RateLimited { retry_after });
            }
        }

        state.cached = None;
        state.blocked_until = None;

        info!("requesting a new access token");
        match self.client.mint_token(&self.credentials).await {
            Ok(grant) => {
                let lifetime = usable_lifetime(grant.expires_in, self.safety_margin);
                let token = grant.access_token;
                state.cached = Some(CachedToken {
                    token: token.clone(),
                    expires_at: Instant::now() + lifetime,
                });
                state.mints += 1;
                info!(
                    declared_secs = grant.expires_in.as_secs(),
                    usable_secs = lifetime.as_secs(),
                    "obtained new access token"
                );
                Ok(token)
            }
            Err(skyport_api::Error::RateLimited { retry_after_secs }) => {
                let retry_after = Duration::from_secs(retry_after_secs);
                state.blocked_until = Some(Instant::now() + retry_after);
                warn!(retry_after_secs, "token endpoint rate limited");
                Err(CoreError::RateLimited { retry_after })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Drop the cached token so the next call mints a fresh one.
    ///
    /// Used when the vendor rejects a token before its computed expiry.
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        if state.cached.take().is_some() {
            debug!("cached access token invalidated");
        }
    }

    /// Number of successful mint calls so far.
    pub async fn mint_count(&self) -> u64 {
        self.state.lock().await.mints
    }
}

/// Portion of the declared lifetime the token is treated as valid for.
///
/// The margin is capped at half the lifetime so short-lived tokens remain
/// usable; the result is strictly less than any non-zero lifetime.
pub(crate) fn usable_lifetime(declared: Duration, margin: Duration) -> Duration {
    declared - margin.min(declared / 2)
}
