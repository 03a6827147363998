//! Dataset-partitioned catalog storage.
//!
//! Covers both halves of the local cache: the insertion-ordered record cache
//! and the per-dataset page cursor. They are one trait because the paging
//! coordinator always commits them together; the composite operations
//! ([`CatalogStore::commit_page`], [`CatalogStore::replace_dataset`]) are the
//! atomic units readers are allowed to observe.

mod memory;
mod sqlite;
mod types;

pub use memory::MemoryCatalogStore;
pub use sqlite::SqliteCatalogStore;
pub use types::PageCursor;

use thiserror::Error;

use crate::dataset::DatasetKey;
use crate::remote::CatalogRecord;

/// Error type for catalog storage operations.
///
/// Storage failures are fatal for the subscription that hit them: neither
/// reads nor writes can proceed safely once the backing store misbehaves.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Backing database error.
    #[error("database error: {0}")]
    Database(String),
}

/// Trait for catalog cache backends.
///
/// All operations are scoped to a single dataset key; no cross-key
/// transactionality is required or provided.
pub trait CatalogStore: Send + Sync {
    /// Insert records at the end of the dataset, in the given order.
    ///
    /// A record whose `id` already exists for this dataset is skipped, not
    /// overwritten (first write wins). Returns the number of records actually
    /// inserted.
    fn append_records(&self, key: &DatasetKey, records: &[CatalogRecord])
        -> Result<u32, StoreError>;

    /// Delete all records for the dataset.
    fn clear_dataset(&self, key: &DatasetKey) -> Result<(), StoreError>;

    /// Read `limit` records starting at `offset`, in insertion order.
    fn read_window(
        &self,
        key: &DatasetKey,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<CatalogRecord>, StoreError>;

    /// Number of cached records for the dataset.
    fn count(&self, key: &DatasetKey) -> Result<u64, StoreError>;

    /// Stored pagination cursor, or `None` if the dataset was never synced.
    fn cursor(&self, key: &DatasetKey) -> Result<Option<PageCursor>, StoreError>;

    /// Upsert the cursor, replacing any prior cursor for the key.
    fn set_cursor(&self, key: &DatasetKey, cursor: &PageCursor) -> Result<(), StoreError>;

    /// Remove the stored cursor.
    fn clear_cursor(&self, key: &DatasetKey) -> Result<(), StoreError>;

    /// Append a fetched page and update the cursor as one visible unit.
    ///
    /// Readers never observe the records without the cursor update or vice
    /// versa. Returns the number of records actually inserted.
    fn commit_page(
        &self,
        key: &DatasetKey,
        records: &[CatalogRecord],
        cursor: &PageCursor,
    ) -> Result<u32, StoreError>;

    /// Atomically replace the whole dataset with a fresh first page.
    ///
    /// Equivalent to clear + append + set-cursor in one unit; used by refresh
    /// so readers see either the full old snapshot or the full new one.
    fn replace_dataset(
        &self,
        key: &DatasetKey,
        records: &[CatalogRecord],
        cursor: &PageCursor,
    ) -> Result<u32, StoreError>;
}
