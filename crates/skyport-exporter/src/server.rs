// ── Metrics endpoint ──
//
// Read-only view of the snapshot store. Never blocks on the poller and
// never fails for business reasons.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;

use skyport_core::SnapshotStore;

/// Prometheus text exposition format.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Body served before the first successful cycle.
pub const NO_DATA_BODY: &str = "# no thermostat data collected yet\n";

pub fn build_router(store: Arc<SnapshotStore>) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .with_state(store)
}

async fn metrics(State(store): State<Arc<SnapshotStore>>) -> Response {
    match store.read() {
        Some(snapshot) => (
            [(header::CONTENT_TYPE, CONTENT_TYPE)],
            snapshot.body.clone(),
        )
            .into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::CONTENT_TYPE, CONTENT_TYPE)],
            NO_DATA_BODY,
        )
            .into_response(),
    }
}
