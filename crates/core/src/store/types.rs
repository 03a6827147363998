//! Types for catalog storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dataset::PageToken;

/// Stored pagination progress for one dataset.
///
/// Absence of a cursor means "never synced, start at page one". A present
/// cursor with `next_page == None` means the dataset is exhausted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageCursor {
    /// Token for the next uncached page, if any.
    pub next_page: Option<PageToken>,
    /// When the last page was committed.
    pub last_synced_at: DateTime<Utc>,
}

impl PageCursor {
    /// Cursor stamped with the current time.
    pub fn new(next_page: Option<PageToken>) -> Self {
        Self {
            next_page,
            last_synced_at: Utc::now(),
        }
    }

    /// Whether a successful fetch reported no further pages.
    pub fn is_exhausted(&self) -> bool {
        self.next_page.is_none()
    }
}
