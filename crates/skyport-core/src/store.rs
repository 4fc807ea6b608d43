// ── Latest-snapshot storage ──
//
// One slot, one writer (the poller), any number of readers (HTTP
// handlers). Publication is a single pointer swap; readers never wait
// on the writer and never see a half-built value.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};

/// Rendered metrics text for the configured thermostat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub body: String,
    pub rendered_at: DateTime<Utc>,
}

/// Holds the most recent [`Snapshot`], if any cycle has succeeded yet.
#[derive(Default)]
pub struct SnapshotStore {
    current: ArcSwapOption<Snapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current snapshot, stamping it with the current time.
    pub fn publish(&self, body: impl Into<String>) -> Arc<Snapshot> {
        self.publish_at(body, Utc::now())
    }

    /// Replace the current snapshot with one rendered at `rendered_at`.
    pub fn publish_at(&self, body: impl Into<String>, rendered_at: DateTime<Utc>) -> Arc<Snapshot> {
        let snapshot = Arc::new(Snapshot {
            body: body.into(),
            rendered_at,
        });
        self.current.store(Some(Arc::clone(&snapshot)));
        snapshot
    }

    /// The latest snapshot, or `None` before the first publication.
    pub fn read(&self) -> Option<Arc<Snapshot>> {
        self.current.load_full()
    }

    /// When the latest snapshot was rendered.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.current.load_full().map(|s| s.rendered_at)
    }
}
