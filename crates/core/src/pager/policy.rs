//! Cache staleness policy.
//!
//! Locale and filter changes never invalidate anything here: they produce a
//! different [`DatasetKey`](crate::dataset::DatasetKey) and therefore a
//! different cache partition; abandoned partitions are only unreferenced.
//! The policy decides the remaining case: whether a durable snapshot is old
//! enough to refresh when a consumer subscribes again.

use chrono::{Duration, Utc};

use crate::store::PageCursor;

/// Decides when a stored dataset snapshot should be refreshed.
#[derive(Debug, Clone)]
pub struct RefreshPolicy {
    stale_after: Duration,
}

impl RefreshPolicy {
    pub fn new(stale_after: Duration) -> Self {
        Self { stale_after }
    }

    pub fn with_stale_minutes(minutes: u64) -> Self {
        Self::new(Duration::minutes(minutes as i64))
    }

    /// Whether the snapshot behind `cursor` is older than the horizon.
    pub fn is_stale(&self, cursor: &PageCursor) -> bool {
        Utc::now().signed_duration_since(cursor.last_synced_at) > self.stale_after
    }
}

impl Default for RefreshPolicy {
    /// 24-hour staleness horizon.
    fn default() -> Self {
        Self::new(Duration::hours(24))
    }
}
