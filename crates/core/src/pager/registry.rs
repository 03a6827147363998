//! Registry of active paging coordinators.
//!
//! An explicit DatasetKey → coordinator map: coordinators are created on
//! first subscription and reclaimed by [`PagerRegistry::evict_unreferenced`]
//! once no view holds them, rather than living as process-wide singletons.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::coordinator::PageCoordinator;
use super::policy::RefreshPolicy;
use super::view::PagedView;
use super::PagerError;
use crate::config::Config;
use crate::dataset::{CacheMode, DatasetKey};
use crate::remote::{PageFetcher, TmdbFetcher};
use crate::store::{CatalogStore, MemoryCatalogStore, SqliteCatalogStore};

/// Creates and tracks one [`PageCoordinator`] per active dataset.
pub struct PagerRegistry {
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn CatalogStore>,
    policy: RefreshPolicy,
    coordinators: Mutex<HashMap<DatasetKey, Arc<PageCoordinator>>>,
}

impl PagerRegistry {
    pub fn new(fetcher: Arc<dyn PageFetcher>, store: Arc<dyn CatalogStore>) -> Self {
        Self {
            fetcher,
            store,
            policy: RefreshPolicy::default(),
            coordinators: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_policy(mut self, policy: RefreshPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Wire a registry from configuration: TMDB fetcher + SQLite store.
    pub fn from_config(config: &Config) -> Result<Self, PagerError> {
        let fetcher = TmdbFetcher::new(config.tmdb.clone())?;
        let store = SqliteCatalogStore::new(&config.cache.db_path)?;
        Ok(Self::new(Arc::new(fetcher), Arc::new(store)).with_policy(
            RefreshPolicy::with_stale_minutes(config.cache.stale_after_minutes),
        ))
    }

    /// Subscribe to a dataset, creating its coordinator on first use.
    ///
    /// Durable datasets share the registry's store; each discover-style
    /// dataset gets a private in-memory cache that dies with its coordinator.
    /// A stale durable snapshot is refreshed here; if that refresh fails the
    /// stale snapshot stays servable (commit-only-on-success).
    pub async fn subscribe(&self, key: DatasetKey) -> Result<PagedView, PagerError> {
        let coordinator = {
            let mut coordinators = self.coordinators.lock().await;
            match coordinators.get(&key) {
                Some(coordinator) => Arc::clone(coordinator),
                None => {
                    let store: Arc<dyn CatalogStore> = match key.cache_mode() {
                        CacheMode::Durable => Arc::clone(&self.store),
                        CacheMode::Ephemeral => Arc::new(MemoryCatalogStore::new()),
                    };
                    debug!("{}: creating coordinator", key);
                    let coordinator = Arc::new(PageCoordinator::new(
                        key.clone(),
                        Arc::clone(&self.fetcher),
                        store,
                    ));
                    coordinators.insert(key.clone(), Arc::clone(&coordinator));
                    coordinator
                }
            }
        };

        match coordinator.stored_cursor().await? {
            // Never synced: the first subscription starts the initial load.
            // A fetch failure leaves the view in an observable error state
            // over an empty cache instead of failing the subscription.
            None => {
                if let Err(e) = coordinator.ensure_window(0).await {
                    if e.is_fatal() {
                        return Err(e);
                    }
                    warn!("{}: initial load failed: {}", key, e);
                }
            }
            Some(cursor) => {
                if key.cache_mode() == CacheMode::Durable && self.policy.is_stale(&cursor) {
                    debug!("{}: snapshot stale, refreshing on subscribe", key);
                    if let Err(e) = coordinator.refresh().await {
                        if e.is_fatal() {
                            return Err(e);
                        }
                        warn!("{}: staleness refresh failed, serving stale snapshot: {}", key, e);
                    }
                }
            }
        }

        Ok(PagedView::new(coordinator))
    }

    /// Drop coordinators no view references anymore. Returns how many were
    /// evicted.
    pub async fn evict_unreferenced(&self) -> usize {
        let mut coordinators = self.coordinators.lock().await;
        let before = coordinators.len();
        coordinators.retain(|_, coordinator| Arc::strong_count(coordinator) > 1);
        let evicted = before - coordinators.len();
        if evicted > 0 {
            debug!("evicted {} unreferenced coordinators", evicted);
        }
        evicted
    }

    /// Number of tracked coordinators.
    pub async fn active_count(&self) -> usize {
        self.coordinators.lock().await.len()
    }
}
