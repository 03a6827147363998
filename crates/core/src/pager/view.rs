//! Consumer-facing lazy paged view.

use std::sync::Arc;

use super::coordinator::{LoadState, PageCoordinator};
use super::PagerError;
use crate::dataset::DatasetKey;
use crate::remote::CatalogRecord;

/// A finite, restartable, lazily-materialized view over one dataset.
///
/// This is the only surface the rendering layer sees. `window` calls signal
/// scroll position; approaching the loaded boundary makes the coordinator
/// fetch the next page before the window is served. Finite because the remote
/// catalog is bounded (`Exhausted`), restartable because [`PagedView::refresh`]
/// re-enters the initial load.
pub struct PagedView {
    coordinator: Arc<PageCoordinator>,
}

impl PagedView {
    pub(crate) fn new(coordinator: Arc<PageCoordinator>) -> Self {
        Self { coordinator }
    }

    pub fn dataset(&self) -> &DatasetKey {
        self.coordinator.key()
    }

    /// Read `limit` records starting at `offset`, loading remote pages on
    /// demand.
    ///
    /// A failed boundary fetch is non-blocking: the cached prefix is served
    /// and the error stays observable through [`PagedView::load_state`]. Only
    /// fatal storage errors propagate.
    pub async fn window(&self, offset: u64, limit: u64) -> Result<Vec<CatalogRecord>, PagerError> {
        if let Err(e) = self.coordinator.ensure_window(offset + limit).await {
            if e.is_fatal() {
                return Err(e);
            }
        }
        self.coordinator.read_window(offset, limit).await
    }

    /// Number of currently cached records.
    pub async fn item_count(&self) -> Result<u64, PagerError> {
        self.coordinator.count().await
    }

    /// Restart the dataset at page one (pull-to-refresh).
    ///
    /// The previous snapshot stays servable until the replacement first page
    /// commits; on failure the error is returned for user-visible messaging.
    pub async fn refresh(&self) -> Result<(), PagerError> {
        self.coordinator.refresh().await
    }

    /// Current coordinator state, for loading spinners and error banners.
    pub async fn load_state(&self) -> LoadState {
        self.coordinator.load_state().await
    }
}
