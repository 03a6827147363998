//! User-curated record lists: favourites and recently browsed.
//!
//! A separate, non-paginated, user-mutated store. Mutations are local and
//! immediately visible to the next read; none of the remote-page invalidation
//! machinery applies. Consumed with the same windowing contract as the paged
//! datasets for UI uniformity, ordered by most recently added.

mod sqlite;

pub use sqlite::SqliteUserListStore;

use crate::dataset::MediaKind;
use crate::remote::CatalogRecord;
use crate::store::StoreError;

/// Which user list an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserList {
    Favourites,
    RecentlyBrowsed,
}

impl UserList {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserList::Favourites => "favourites",
            UserList::RecentlyBrowsed => "recently_browsed",
        }
    }
}

/// Trait for user list storage backends.
pub trait UserListStore: Send + Sync {
    /// Insert or re-add a record. Re-adding bumps it to the front of the
    /// list (its added-at timestamp is refreshed).
    fn add(&self, list: UserList, record: &CatalogRecord) -> Result<(), StoreError>;

    /// Remove a record ("unlike" / clear one history entry).
    fn remove(&self, list: UserList, media: MediaKind, id: u64) -> Result<(), StoreError>;

    /// Whether the record is on the list.
    fn contains(&self, list: UserList, media: MediaKind, id: u64) -> Result<bool, StoreError>;

    /// Read `limit` records starting at `offset`, most recently added first.
    fn window(
        &self,
        list: UserList,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<CatalogRecord>, StoreError>;

    /// Number of records on the list.
    fn count(&self, list: UserList) -> Result<u64, StoreError>;

    /// Remove every record on the list.
    fn clear(&self, list: UserList) -> Result<(), StoreError>;
}
