//! Per-dataset paging coordinator.
//!
//! One coordinator drives one dataset's refresh/append lifecycle through the
//! states `Idle`, `LoadingInitial`, `LoadingMore`, `Exhausted`, `Error`. At
//! most one fetch is in flight per dataset; concurrent triggers coalesce. The
//! state lock is never held across the network await, only during the local
//! commit step.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::PagerError;
use crate::dataset::{DatasetKey, PageToken};
use crate::remote::{CatalogRecord, FetchError, PageFetcher, LIST_PAGE_SIZE};
use crate::store::{CatalogStore, PageCursor, StoreError};

/// Observable snapshot of the coordinator state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Idle,
    LoadingInitial,
    LoadingMore,
    /// No further remote pages exist for this cache generation. Only exited
    /// by a refresh.
    Exhausted,
    /// Last trigger failed. Non-fatal errors are retried by the next
    /// consumer-driven trigger; fatal (storage) errors terminate the
    /// subscription.
    Error { message: String, fatal: bool },
}

#[derive(Debug, Clone)]
enum Phase {
    Idle,
    LoadingInitial,
    LoadingMore,
    Exhausted,
    Error { error: PagerError, fatal: bool },
}

#[derive(Debug, Clone, Copy)]
enum LoadKind {
    /// First sync of a never-synced dataset.
    Initial,
    /// Demand-driven fetch of the next uncached page.
    More(PageToken),
    /// Explicit refresh: restart at page one, swap the snapshot on success.
    Refresh,
}

/// Coordinates the paging lifecycle for a single [`DatasetKey`].
pub struct PageCoordinator {
    key: DatasetKey,
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn CatalogStore>,
    state: Arc<Mutex<Phase>>,
}

impl PageCoordinator {
    pub fn new(
        key: DatasetKey,
        fetcher: Arc<dyn PageFetcher>,
        store: Arc<dyn CatalogStore>,
    ) -> Self {
        Self {
            key,
            fetcher,
            store,
            state: Arc::new(Mutex::new(Phase::Idle)),
        }
    }

    pub fn key(&self) -> &DatasetKey {
        &self.key
    }

    /// Current state machine snapshot.
    pub async fn load_state(&self) -> LoadState {
        match &*self.state.lock().await {
            Phase::Idle => LoadState::Idle,
            Phase::LoadingInitial => LoadState::LoadingInitial,
            Phase::LoadingMore => LoadState::LoadingMore,
            Phase::Exhausted => LoadState::Exhausted,
            Phase::Error { error, fatal } => LoadState::Error {
                message: error.to_string(),
                fatal: *fatal,
            },
        }
    }

    /// Read cached records in insertion order.
    pub async fn read_window(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<CatalogRecord>, PagerError> {
        match self.store.read_window(&self.key, offset, limit) {
            Ok(records) => Ok(records),
            Err(e) => Err(self.fail_storage(e).await),
        }
    }

    /// Number of cached records.
    pub async fn count(&self) -> Result<u64, PagerError> {
        match self.store.count(&self.key) {
            Ok(count) => Ok(count),
            Err(e) => Err(self.fail_storage(e).await),
        }
    }

    /// Stored pagination cursor, if the dataset has ever synced.
    pub async fn stored_cursor(&self) -> Result<Option<PageCursor>, PagerError> {
        match self.store.cursor(&self.key) {
            Ok(cursor) => Ok(cursor),
            Err(e) => Err(self.fail_storage(e).await),
        }
    }

    /// Fetch pages until the cache covers `upper_bound` plus one page of
    /// lookahead, the dataset is exhausted, or a fetch fails.
    ///
    /// This is the demand rule: a window whose upper bound comes within one
    /// remote page of the cached count triggers the next fetch. A dataset
    /// that was never synced loads its first page regardless of the bound.
    /// Each successful iteration commits a full page, so the loop always
    /// makes progress.
    pub async fn ensure_window(&self, upper_bound: u64) -> Result<(), PagerError> {
        loop {
            {
                let phase = self.state.lock().await;
                match &*phase {
                    Phase::Error { error, fatal: true } => return Err(error.clone()),
                    Phase::Exhausted => return Ok(()),
                    _ => {}
                }
            }

            let cursor = match self.store.cursor(&self.key) {
                Ok(cursor) => cursor,
                Err(e) => return Err(self.fail_storage(e).await),
            };

            let kind = match cursor {
                None => LoadKind::Initial,
                Some(cursor) => match cursor.next_page {
                    None => return Ok(()),
                    Some(token) => {
                        let count = match self.store.count(&self.key) {
                            Ok(count) => count,
                            Err(e) => return Err(self.fail_storage(e).await),
                        };
                        if upper_bound + LIST_PAGE_SIZE as u64 <= count {
                            return Ok(());
                        }
                        LoadKind::More(token)
                    }
                },
            };

            if !self.trigger(kind).await? {
                // Coalesced with another trigger; the in-flight request's
                // result determines the next state.
                return Ok(());
            }
        }
    }

    /// Restart this dataset at page one.
    ///
    /// The existing snapshot is not cleared until the replacement first page
    /// has been fetched successfully; a failed refresh leaves the prior cache
    /// fully servable.
    pub async fn refresh(&self) -> Result<(), PagerError> {
        self.trigger(LoadKind::Refresh).await.map(|_| ())
    }

    /// Start a fetch unless one is already in flight. Returns `false` when
    /// the trigger was coalesced.
    async fn trigger(&self, kind: LoadKind) -> Result<bool, PagerError> {
        {
            let mut phase = self.state.lock().await;
            match &*phase {
                Phase::LoadingInitial | Phase::LoadingMore => {
                    debug!("{}: trigger coalesced, fetch already in flight", self.key);
                    return Ok(false);
                }
                Phase::Error { error, fatal: true } => return Err(error.clone()),
                Phase::Exhausted if !matches!(kind, LoadKind::Refresh) => return Ok(false),
                _ => {}
            }
            *phase = match kind {
                LoadKind::More(_) => Phase::LoadingMore,
                LoadKind::Initial | LoadKind::Refresh => Phase::LoadingInitial,
            };
        }

        // The fetch-and-commit runs in its own task so it completes and
        // commits even if the initiating caller is cancelled mid-fetch; the
        // cache stays warm for the next subscriber.
        let key = self.key.clone();
        let fetcher = Arc::clone(&self.fetcher);
        let store = Arc::clone(&self.store);
        let state = Arc::clone(&self.state);
        let handle =
            tokio::spawn(async move { Self::fetch_and_commit(key, fetcher, store, state, kind).await });

        match handle.await {
            Ok(result) => result.map(|_| true),
            Err(e) => Err(PagerError::Fetch(FetchError::Network(format!(
                "fetch task failed: {}",
                e
            )))),
        }
    }

    async fn fetch_and_commit(
        key: DatasetKey,
        fetcher: Arc<dyn PageFetcher>,
        store: Arc<dyn CatalogStore>,
        state: Arc<Mutex<Phase>>,
        kind: LoadKind,
    ) -> Result<(), PagerError> {
        let token = match kind {
            LoadKind::More(token) => token,
            LoadKind::Initial | LoadKind::Refresh => PageToken::FIRST,
        };

        let fetched = fetcher.fetch_page(&key, token).await;

        // Lock held only for the local commit step, never across the fetch.
        let mut phase = state.lock().await;
        match fetched {
            Ok(page) => {
                let cursor = PageCursor::new(page.next_page);
                let exhausted = cursor.is_exhausted();
                let committed = match kind {
                    LoadKind::Initial | LoadKind::Refresh => {
                        store.replace_dataset(&key, &page.records, &cursor)
                    }
                    LoadKind::More(_) => store.commit_page(&key, &page.records, &cursor),
                };
                match committed {
                    Ok(inserted) => {
                        debug!(
                            "{}: committed page {} ({} new records, exhausted={})",
                            key,
                            token.value(),
                            inserted,
                            exhausted
                        );
                        *phase = if exhausted { Phase::Exhausted } else { Phase::Idle };
                        Ok(())
                    }
                    Err(e) => {
                        let error = PagerError::Storage(e);
                        warn!("{}: failed to commit page {}: {}", key, token.value(), error);
                        *phase = Phase::Error {
                            error: error.clone(),
                            fatal: true,
                        };
                        Err(error)
                    }
                }
            }
            Err(e) => {
                let error = PagerError::Fetch(e);
                warn!("{}: page {} fetch failed: {}", key, token.value(), error);
                // Already-cached pages are untouched; only the in-flight page
                // is lost. The next consumer trigger re-attempts.
                *phase = Phase::Error {
                    error: error.clone(),
                    fatal: false,
                };
                Err(error)
            }
        }
    }

    async fn fail_storage(&self, e: StoreError) -> PagerError {
        let error = PagerError::Storage(e);
        warn!("{}: storage failure, terminating subscription: {}", self.key, error);
        let mut phase = self.state.lock().await;
        *phase = Phase::Error {
            error: error.clone(),
            fatal: true,
        };
        error
    }
}
