//! Remote-mediated paginated catalog cache.
//!
//! Turns an externally paged, rate-limited catalog API into a locally
//! persisted, resumable, deduplicated, windowed sequence of records. Each
//! dataset (media kind + scope + locale) is an independent pagination stream
//! with its own cursor and cache partition; a per-dataset coordinator drives
//! the refresh/append lifecycle and consumers read through a lazy
//! [`PagedView`].

pub mod config;
pub mod dataset;
pub mod pager;
pub mod remote;
pub mod store;
pub mod testing;
pub mod userlist;

pub use config::{load_config, load_config_from_str, CacheConfig, Config, ConfigError};
pub use dataset::{CacheMode, DatasetKey, DiscoverCriteria, MediaKind, PageToken, Scope, SortBy};
pub use pager::{LoadState, PageCoordinator, PagedView, PagerError, PagerRegistry, RefreshPolicy};
pub use remote::{
    CatalogRecord, FetchError, PageFetcher, PageResult, TmdbConfig, TmdbFetcher, LIST_PAGE_SIZE,
};
pub use store::{CatalogStore, MemoryCatalogStore, PageCursor, SqliteCatalogStore, StoreError};
pub use userlist::{SqliteUserListStore, UserList, UserListStore};
