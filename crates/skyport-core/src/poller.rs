// ── Polling coordinator ──
//
// Background loop: RESOLVE (token, device id by name) then FETCH (record,
// render, publish), then sleep. Cycles are strictly sequential; the delay
// starts when a cycle ends. A failed cycle publishes nothing and the loop
// carries on with the next one.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use skyport_api::{DeviceSummary, SkyportClient};

use crate::config::ExporterConfig;
use crate::error::CoreError;
use crate::render;
use crate::store::SnapshotStore;
use crate::token::TokenManager;

// ── Cycle phases ─────────────────────────────────────────────────

/// The two phases of a polling cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Obtain a token and look up the thermostat's device id.
    Resolve,
    /// Fetch the device record, render it and publish the snapshot.
    Fetch,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Resolve => "resolve",
            Self::Fetch => "fetch",
        })
    }
}

/// A failed cycle, tagged with the phase it failed in.
#[derive(Debug, Error)]
#[error("{phase} phase failed: {source}")]
pub struct CycleError {
    pub phase: Phase,
    #[source]
    pub source: CoreError,
}

impl CycleError {
    fn resolve(source: CoreError) -> Self {
        Self {
            phase: Phase::Resolve,
            source,
        }
    }

    fn fetch(source: CoreError) -> Self {
        Self {
            phase: Phase::Fetch,
            source,
        }
    }
}

// ── Poller ───────────────────────────────────────────────────────

/// Drives polling cycles for one thermostat.
pub struct Poller {
    client: Arc<SkyportClient>,
    tokens: Arc<TokenManager>,
    store: Arc<SnapshotStore>,
    thermostat: String,
    interval: Duration,
}

impl Poller {
    pub fn new(
        client: Arc<SkyportClient>,
        tokens: Arc<TokenManager>,
        store: Arc<SnapshotStore>,
        thermostat: impl Into<String>,
        interval: Duration,
    ) -> Self {
        Self {
            client,
            tokens,
            store,
            thermostat: thermostat.into(),
            interval,
        }
    }

    /// Build the client and token manager described by `config`.
    pub fn from_config(config: &ExporterConfig, store: Arc<SnapshotStore>) -> Result<Self, CoreError> {
        let client = Arc::new(SkyportClient::new(
            &config.base_url,
            &config.credentials.api_key,
            &config.transport(),
        )?);
        let tokens = Arc::new(TokenManager::new(
            Arc::clone(&client),
            config.credentials.clone(),
            config.token_margin,
        ));
        Ok(Self::new(
            client,
            tokens,
            store,
            config.thermostat.clone(),
            config.poll_interval,
        ))
    }

    /// Run one complete cycle. Publishes only if both phases succeed.
    pub async fn poll_once(&self) -> Result<(), CycleError> {
        let device = self.resolve().await.map_err(CycleError::resolve)?;
        self.fetch(&device).await.map_err(CycleError::fetch)
    }

    async fn resolve(&self) -> Result<DeviceSummary, CoreError> {
        let token = self.tokens.valid_token().await?;
        let devices = self.client.list_devices(&token).await?;
        debug!(count = devices.len(), "listed thermostats");

        devices
            .into_iter()
            .find(|d| d.matches_name(&self.thermostat))
            .ok_or_else(|| CoreError::DeviceNotFound {
                name: self.thermostat.clone(),
            })
    }

    async fn fetch(&self, device: &DeviceSummary) -> Result<(), CoreError> {
        let token = self.tokens.valid_token().await?;
        info!(thermostat = %self.thermostat, device_id = %device.id, "updating thermostat data");
        let record = self.client.fetch_device(&token, &device.id).await?;

        let rendered_at = Utc::now();
        let body = render::render(&self.thermostat, &record, rendered_at);
        self.store.publish_at(body, rendered_at);
        debug!(fields = record.len(), "snapshot published");
        Ok(())
    }

    /// Run one cycle, log its outcome and return how long to wait before
    /// the next one.
    async fn run_cycle(&self) -> Duration {
        let Err(err) = self.poll_once().await else {
            return self.interval;
        };

        if err.source.is_unauthorized() {
            self.tokens.invalidate().await;
        }

        let delay = next_delay(self.interval, &err.source);
        let stale_secs = snapshot_age_secs(&self.store, Utc::now());
        if err.source.is_misconfiguration() {
            error!(
                phase = %err.phase,
                kind = err.source.kind(),
                error = %err.source,
                retry_in_secs = delay.as_secs(),
                stale_secs,
                "polling cycle failed"
            );
        } else {
            warn!(
                phase = %err.phase,
                kind = err.source.kind(),
                error = %err.source,
                retry_in_secs = delay.as_secs(),
                stale_secs,
                "polling cycle failed"
            );
        }
        delay
    }

    /// Start the polling loop as a background task.
    ///
    /// The first cycle runs immediately.
    pub fn spawn(self) -> PollerHandle {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(poll_task(self, cancel.clone()));
        PollerHandle { cancel, task }
    }
}

/// Delay before the next cycle after a failure.
///
/// Rate limiting stretches the delay to at least the vendor's backoff;
/// everything else keeps the normal cadence.
pub fn next_delay(interval: Duration, err: &CoreError) -> Duration {
    match err {
        CoreError::RateLimited { retry_after } => interval.max(*retry_after),
        _ => interval,
    }
}

/// Seconds since the served snapshot was rendered, if there is one.
fn snapshot_age_secs(store: &SnapshotStore, now: DateTime<Utc>) -> Option<i64> {
    store
        .last_updated()
        .map(|rendered_at| (now - rendered_at).num_seconds().max(0))
}

async fn poll_task(poller: Poller, cancel: CancellationToken) {
    info!(
        thermostat = %poller.thermostat,
        interval_secs = poller.interval.as_secs(),
        "poller started"
    );

    loop {
        let delay = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            delay = poller.run_cycle() => delay,
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }
    }

    info!("poller stopped");
}

// ── PollerHandle ─────────────────────────────────────────────────

/// Owner of the running polling task.
pub struct PollerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel the loop and wait for it to exit.
    ///
    /// An in-flight request is abandoned rather than drained.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "poller task ended abnormally");
        }
    }
}
