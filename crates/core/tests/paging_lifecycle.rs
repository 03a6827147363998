//! Paging lifecycle integration tests.
//!
//! Exercises the coordinator/view/registry stack against the mock fetcher and
//! the SQLite store:
//! - Gap-free sequential page assembly and duplicate-delivery dedup
//! - Atomic refresh (readers see full old or full new snapshot)
//! - Exhaustion as a terminal per-generation state
//! - Dataset isolation across locales
//! - Failure handling: fetch errors retryable, storage errors fatal
//! - Trigger coalescing while a fetch is in flight

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use marquee_core::{
    testing::{fixtures, MockPageFetcher},
    CatalogRecord, CatalogStore, DatasetKey, FetchError, LoadState, MemoryCatalogStore,
    PageCursor, PagedView, PagerRegistry, RefreshPolicy, SqliteCatalogStore, SqliteUserListStore,
    StoreError, UserList, UserListStore,
};

/// Test helper wiring a mock fetcher and a file-backed store.
struct TestHarness {
    fetcher: MockPageFetcher,
    registry: PagerRegistry,
    _temp_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_policy(RefreshPolicy::default())
    }

    fn with_policy(policy: RefreshPolicy) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("catalog.db");
        let store =
            Arc::new(SqliteCatalogStore::new(&db_path).expect("Failed to create catalog store"));
        let fetcher = MockPageFetcher::new();
        let registry =
            PagerRegistry::new(Arc::new(fetcher.clone()), store).with_policy(policy);

        Self {
            fetcher,
            registry,
            _temp_dir: temp_dir,
        }
    }

    async fn subscribe(&self, key: &DatasetKey) -> PagedView {
        self.registry
            .subscribe(key.clone())
            .await
            .expect("Failed to subscribe")
    }
}

fn ids(records: &[CatalogRecord]) -> Vec<u64> {
    records.iter().map(|r| r.id).collect()
}

#[tokio::test]
async fn test_sequential_pages_assemble_without_gaps() {
    let harness = TestHarness::new();
    let key = fixtures::popular_movies("en-US");

    harness
        .fetcher
        .script_pages(
            &key,
            vec![
                fixtures::movie_page(&(1..=20).collect::<Vec<_>>()),
                fixtures::movie_page(&(21..=40).collect::<Vec<_>>()),
                fixtures::movie_page(&(41..=60).collect::<Vec<_>>()),
            ],
        )
        .await;

    let view = harness.subscribe(&key).await;
    let window = view.window(0, 60).await.unwrap();

    // Exactly the concatenation of all fetched pages, in fetch order.
    assert_eq!(ids(&window), (1..=60).collect::<Vec<_>>());
    assert_eq!(view.item_count().await.unwrap(), 60);

    let fetches = harness.fetcher.recorded_fetches().await;
    let pages: Vec<u32> = fetches.iter().map(|f| f.page).collect();
    assert_eq!(pages, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_duplicate_delivery_is_idempotent() {
    let harness = TestHarness::new();
    let key = fixtures::popular_movies("en-US");

    // Page 2 re-delivers id 3 (overlapping pages on the remote side).
    harness
        .fetcher
        .script_pages(
            &key,
            vec![
                fixtures::movie_page(&[1, 2, 3]),
                fixtures::movie_page(&[3, 4, 5]),
            ],
        )
        .await;

    let view = harness.subscribe(&key).await;

    let first = view.window(0, 3).await.unwrap();
    assert_eq!(ids(&first), vec![1, 2, 3]);

    let all = view.window(0, 10).await.unwrap();
    assert_eq!(ids(&all), vec![1, 2, 3, 4, 5]);
    assert_eq!(view.item_count().await.unwrap(), 5);
    assert_eq!(view.load_state().await, LoadState::Exhausted);

    // Dataset exhausted: further window calls trigger no fetches.
    let fetched = harness.fetcher.fetch_count().await;
    view.window(0, 100).await.unwrap();
    view.window(50, 100).await.unwrap();
    assert_eq!(harness.fetcher.fetch_count().await, fetched);
}

#[tokio::test]
async fn test_refresh_swaps_snapshot_atomically() {
    let harness = TestHarness::new();
    let key = fixtures::popular_movies("en-US");

    harness
        .fetcher
        .script_pages(&key, vec![fixtures::movie_page(&[1, 2, 3])])
        .await;

    let view = harness.subscribe(&key).await;
    assert_eq!(ids(&view.window(0, 10).await.unwrap()), vec![1, 2, 3]);

    // The remote list has rotated; the refresh runs slowly enough for a
    // concurrent reader to observe the in-between state.
    harness
        .fetcher
        .script_pages(&key, vec![fixtures::movie_page(&[7, 8, 9])])
        .await;
    harness
        .fetcher
        .set_latency(Duration::from_millis(100))
        .await;

    let refresher = harness.subscribe(&key).await;
    let refresh_task = tokio::spawn(async move { refresher.refresh().await });

    tokio::time::sleep(Duration::from_millis(20)).await;

    // Refresh in flight: the reader sees the full pre-refresh snapshot, not
    // an empty or mixed result.
    let mid = view.window(0, 10).await.unwrap();
    assert_eq!(ids(&mid), vec![1, 2, 3]);

    refresh_task.await.unwrap().unwrap();

    let after = view.window(0, 10).await.unwrap();
    assert_eq!(ids(&after), vec![7, 8, 9]);
    assert_eq!(view.item_count().await.unwrap(), 3);
}

#[tokio::test]
async fn test_failed_refresh_preserves_previous_snapshot() {
    let harness = TestHarness::new();
    let key = fixtures::popular_movies("en-US");

    harness
        .fetcher
        .script_pages(&key, vec![fixtures::movie_page(&[1, 2, 3])])
        .await;

    let view = harness.subscribe(&key).await;
    view.window(0, 3).await.unwrap();

    harness
        .fetcher
        .set_next_error(FetchError::Network("connection reset".to_string()))
        .await;

    let err = view.refresh().await.unwrap_err();
    assert!(!err.is_fatal());

    // No empty state: the pre-refresh cache is fully servable.
    assert_eq!(ids(&view.window(0, 10).await.unwrap()), vec![1, 2, 3]);
    assert!(matches!(
        view.load_state().await,
        LoadState::Error { fatal: false, .. }
    ));

    // The next refresh succeeds and restarts the generation.
    view.refresh().await.unwrap();
    assert_eq!(ids(&view.window(0, 10).await.unwrap()), vec![1, 2, 3]);
    assert_eq!(view.load_state().await, LoadState::Exhausted);
}

#[tokio::test]
async fn test_loading_more_failure_keeps_loaded_pages() {
    let harness = TestHarness::new();
    let key = fixtures::popular_movies("en-US");

    harness
        .fetcher
        .script_pages(
            &key,
            vec![
                fixtures::movie_page(&(1..=20).collect::<Vec<_>>()),
                fixtures::movie_page(&(21..=40).collect::<Vec<_>>()),
                fixtures::movie_page(&(41..=60).collect::<Vec<_>>()),
            ],
        )
        .await;

    let view = harness.subscribe(&key).await;
    view.window(0, 20).await.unwrap();
    assert_eq!(view.item_count().await.unwrap(), 40);

    harness
        .fetcher
        .set_next_error(FetchError::Network("timeout".to_string()))
        .await;

    // The boundary fetch fails, but the call still serves what is cached.
    let window = view.window(25, 15).await.unwrap();
    assert_eq!(ids(&window), (26..=40).collect::<Vec<_>>());
    assert!(matches!(
        view.load_state().await,
        LoadState::Error { fatal: false, .. }
    ));

    // No automatic retry happened; the next scroll re-attempts and succeeds.
    let fetched = harness.fetcher.fetch_count().await;
    let window = view.window(40, 20).await.unwrap();
    assert_eq!(ids(&window), (41..=60).collect::<Vec<_>>());
    assert_eq!(harness.fetcher.fetch_count().await, fetched + 1);
    assert_eq!(view.item_count().await.unwrap(), 60);
}

#[tokio::test]
async fn test_dataset_keys_are_isolated() {
    let harness = TestHarness::new();
    let en = fixtures::popular_movies("en-US");
    let pl = fixtures::popular_movies("pl-PL");

    harness
        .fetcher
        .script_pages(&en, vec![fixtures::movie_page(&[1, 2, 3])])
        .await;
    harness
        .fetcher
        .script_pages(&pl, vec![fixtures::movie_page(&[1, 2])])
        .await;

    let en_view = harness.subscribe(&en).await;
    let pl_view = harness.subscribe(&pl).await;

    assert_eq!(ids(&en_view.window(0, 10).await.unwrap()), vec![1, 2, 3]);
    assert_eq!(ids(&pl_view.window(0, 10).await.unwrap()), vec![1, 2]);

    // Refreshing one locale's partition never touches the other's.
    harness
        .fetcher
        .script_pages(&pl, vec![fixtures::movie_page(&[9])])
        .await;
    pl_view.refresh().await.unwrap();

    assert_eq!(ids(&pl_view.window(0, 10).await.unwrap()), vec![9]);
    assert_eq!(ids(&en_view.window(0, 10).await.unwrap()), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_concurrent_refresh_triggers_are_coalesced() {
    let harness = TestHarness::new();
    let key = fixtures::popular_movies("en-US");

    harness
        .fetcher
        .script_pages(&key, vec![fixtures::movie_page(&[1, 2, 3])])
        .await;

    let view = harness.subscribe(&key).await;
    let other = harness.subscribe(&key).await;
    assert_eq!(harness.fetcher.fetch_count().await, 1);

    harness
        .fetcher
        .set_latency(Duration::from_millis(100))
        .await;

    // First refresh re-enters LoadingInitial and is slow; the second one
    // arrives mid-flight and is ignored, not queued.
    let refresh_task = tokio::spawn(async move { view.refresh().await });
    tokio::time::sleep(Duration::from_millis(20)).await;
    other.refresh().await.unwrap();

    refresh_task.await.unwrap().unwrap();

    // Initial load plus exactly one refresh fetch.
    assert_eq!(harness.fetcher.fetch_count().await, 2);
    assert_eq!(ids(&other.window(0, 10).await.unwrap()), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_cache_resumes_across_restart() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("catalog.db");
    let key = fixtures::popular_movies("en-US");

    {
        let fetcher = MockPageFetcher::new();
        fetcher
            .script_pages(
                &key,
                vec![
                    fixtures::movie_page(&(1..=20).collect::<Vec<_>>()),
                    fixtures::movie_page(&(21..=40).collect::<Vec<_>>()),
                ],
            )
            .await;
        let store = Arc::new(SqliteCatalogStore::new(&db_path).unwrap());
        let registry = PagerRegistry::new(Arc::new(fetcher.clone()), store);
        let view = registry.subscribe(key.clone()).await.unwrap();
        view.window(0, 20).await.unwrap();
    }

    // A fresh process: the snapshot is served from disk, nothing refetched.
    let fetcher = MockPageFetcher::new();
    let store = Arc::new(SqliteCatalogStore::new(&db_path).unwrap());
    let registry = PagerRegistry::new(Arc::new(fetcher.clone()), store);

    let view = registry.subscribe(key).await.unwrap();
    assert_eq!(view.item_count().await.unwrap(), 40);
    let window = view.window(0, 40).await.unwrap();
    assert_eq!(ids(&window), (1..=40).collect::<Vec<_>>());
    assert_eq!(fetcher.fetch_count().await, 0);
}

#[tokio::test]
async fn test_stale_snapshot_refreshes_on_subscribe() {
    // Zero-minute horizon: any persisted snapshot counts as stale.
    let harness = TestHarness::with_policy(RefreshPolicy::with_stale_minutes(0));
    let key = fixtures::popular_movies("en-US");

    harness
        .fetcher
        .script_pages(&key, vec![fixtures::movie_page(&[1, 2, 3])])
        .await;

    {
        let view = harness.subscribe(&key).await;
        view.window(0, 3).await.unwrap();
    }
    assert_eq!(harness.fetcher.fetch_count().await, 1);

    harness
        .fetcher
        .script_pages(&key, vec![fixtures::movie_page(&[4, 5, 6])])
        .await;

    let view = harness.subscribe(&key).await;
    assert_eq!(harness.fetcher.fetch_count().await, 2);
    assert_eq!(ids(&view.window(0, 10).await.unwrap()), vec![4, 5, 6]);
}

/// Store wrapper that starts failing on demand.
struct FailingStore {
    inner: MemoryCatalogStore,
    failing: AtomicBool,
}

impl FailingStore {
    fn new() -> Self {
        Self {
            inner: MemoryCatalogStore::new(),
            failing: AtomicBool::new(false),
        }
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Database("disk I/O error".to_string()))
        } else {
            Ok(())
        }
    }
}

impl CatalogStore for FailingStore {
    fn append_records(&self, key: &DatasetKey, records: &[CatalogRecord]) -> Result<u32, StoreError> {
        self.check()?;
        self.inner.append_records(key, records)
    }

    fn clear_dataset(&self, key: &DatasetKey) -> Result<(), StoreError> {
        self.check()?;
        self.inner.clear_dataset(key)
    }

    fn read_window(
        &self,
        key: &DatasetKey,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<CatalogRecord>, StoreError> {
        self.check()?;
        self.inner.read_window(key, offset, limit)
    }

    fn count(&self, key: &DatasetKey) -> Result<u64, StoreError> {
        self.check()?;
        self.inner.count(key)
    }

    fn cursor(&self, key: &DatasetKey) -> Result<Option<PageCursor>, StoreError> {
        self.check()?;
        self.inner.cursor(key)
    }

    fn set_cursor(&self, key: &DatasetKey, cursor: &PageCursor) -> Result<(), StoreError> {
        self.check()?;
        self.inner.set_cursor(key, cursor)
    }

    fn clear_cursor(&self, key: &DatasetKey) -> Result<(), StoreError> {
        self.check()?;
        self.inner.clear_cursor(key)
    }

    fn commit_page(
        &self,
        key: &DatasetKey,
        records: &[CatalogRecord],
        cursor: &PageCursor,
    ) -> Result<u32, StoreError> {
        self.check()?;
        self.inner.commit_page(key, records, cursor)
    }

    fn replace_dataset(
        &self,
        key: &DatasetKey,
        records: &[CatalogRecord],
        cursor: &PageCursor,
    ) -> Result<u32, StoreError> {
        self.check()?;
        self.inner.replace_dataset(key, records, cursor)
    }
}

#[tokio::test]
async fn test_storage_failure_terminates_subscription() {
    let fetcher = MockPageFetcher::new();
    let store = Arc::new(FailingStore::new());
    let registry = PagerRegistry::new(
        Arc::new(fetcher.clone()),
        Arc::clone(&store) as Arc<dyn CatalogStore>,
    );

    let key = fixtures::popular_movies("en-US");
    fetcher
        .script_pages(
            &key,
            vec![
                fixtures::movie_page(&(1..=20).collect::<Vec<_>>()),
                fixtures::movie_page(&(21..=40).collect::<Vec<_>>()),
            ],
        )
        .await;

    let view = registry.subscribe(key).await.unwrap();
    view.window(0, 0).await.unwrap();

    store.failing.store(true, Ordering::SeqCst);

    // Distinct from "no next page": a fatal error, not an empty window.
    let err = view.window(0, 40).await.unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(
        view.load_state().await,
        LoadState::Error { fatal: true, .. }
    ));

    // The subscription stays terminated even after the store recovers.
    store.failing.store(false, Ordering::SeqCst);
    assert!(view.window(0, 40).await.unwrap_err().is_fatal());
    assert!(view.refresh().await.unwrap_err().is_fatal());
}

#[tokio::test]
async fn test_user_list_mutations_visible_immediately() {
    let store = SqliteUserListStore::in_memory().unwrap();

    store
        .add(UserList::Favourites, &fixtures::movie_record(603))
        .unwrap();
    store
        .add(UserList::Favourites, &fixtures::tv_record(1396))
        .unwrap();

    // Most recently liked first, no remote round-trip involved.
    let window = store.window(UserList::Favourites, 0, 10).unwrap();
    assert_eq!(ids(&window), vec![1396, 603]);

    store
        .remove(
            UserList::Favourites,
            marquee_core::MediaKind::Movie,
            603,
        )
        .unwrap();
    assert_eq!(store.count(UserList::Favourites).unwrap(), 1);
}
