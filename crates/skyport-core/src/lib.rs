//! Polling and token lifecycle between `skyport-api` and the metrics endpoint.
//!
//! This crate owns everything with temporal or concurrency hazards:
//!
//! - **[`TokenManager`]**: Caches the bearer token and its expiry instant.
//!   [`valid_token()`](TokenManager::valid_token) renews single-flight under an
//!   async mutex, so concurrent callers share one mint request, and refuses to
//!   mint again before a vendor-imposed rate-limit backoff has elapsed.
//!
//! - **[`SnapshotStore`]**: Latest rendered metrics text behind an
//!   `ArcSwapOption`. One writer, any number of lock-free readers; `None`
//!   until the first successful cycle.
//!
//! - **[`Poller`]**: Background resolve-then-fetch loop with a fixed
//!   inter-cycle delay. Failed cycles are logged and never touch the
//!   published snapshot. [`Poller::spawn`] returns a [`PollerHandle`] for
//!   cancellation at shutdown.
//!
//! - **[`render`]**: Declarative metric table turning one device record
//!   into exposition-format text.

pub mod config;
pub mod error;
pub mod poller;
pub mod render;
pub mod store;
pub mod token;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::ExporterConfig;
pub use error::CoreError;
pub use poller::{CycleError, Phase, Poller, PollerHandle};
pub use store::{Snapshot, SnapshotStore};
pub use token::TokenManager;

pub use skyport_api::{Credentials, DeviceRecord};
