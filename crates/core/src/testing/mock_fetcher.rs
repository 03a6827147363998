//! Mock page fetcher for testing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::dataset::{DatasetKey, PageToken};
use crate::remote::{CatalogRecord, FetchError, PageFetcher, PageResult};

/// A recorded page fetch for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedFetch {
    /// Storage key of the requested dataset.
    pub dataset: String,
    /// Requested page number.
    pub page: u32,
}

/// Mock implementation of the [`PageFetcher`] trait.
///
/// Provides controllable behavior for testing:
/// - Script pages per dataset with chained successor tokens
/// - Track fetches for assertions
/// - Simulate failures (one-shot error injection)
/// - Add artificial latency to open coalescing windows
#[derive(Debug, Clone, Default)]
pub struct MockPageFetcher {
    pages: Arc<RwLock<HashMap<(String, u32), PageResult>>>,
    fetches: Arc<RwLock<Vec<RecordedFetch>>>,
    next_error: Arc<RwLock<Option<FetchError>>>,
    latency: Arc<RwLock<Option<Duration>>>,
}

impl MockPageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script one page with an explicit result.
    pub async fn set_page(&self, key: &DatasetKey, page: u32, result: PageResult) {
        self.pages
            .write()
            .await
            .insert((key.storage_key(), page), result);
    }

    /// Script a full dataset: consecutive pages starting at page one, with
    /// successor tokens chained and the last page reporting exhaustion.
    pub async fn script_pages(&self, key: &DatasetKey, pages: Vec<Vec<CatalogRecord>>) {
        let total = pages.len() as u32;
        let mut map = self.pages.write().await;
        for (idx, records) in pages.into_iter().enumerate() {
            let page = idx as u32 + 1;
            let next_page = if page < total {
                Some(PageToken::new(page + 1))
            } else {
                None
            };
            map.insert((key.storage_key(), page), PageResult { records, next_page });
        }
    }

    /// Configure the next fetch to fail with the given error.
    pub async fn set_next_error(&self, error: FetchError) {
        *self.next_error.write().await = Some(error);
    }

    /// Add artificial latency to every fetch.
    pub async fn set_latency(&self, latency: Duration) {
        *self.latency.write().await = Some(latency);
    }

    /// Number of fetches performed (including failed ones).
    pub async fn fetch_count(&self) -> usize {
        self.fetches.read().await.len()
    }

    /// All recorded fetches, in order.
    pub async fn recorded_fetches(&self) -> Vec<RecordedFetch> {
        self.fetches.read().await.clone()
    }

    async fn take_error(&self) -> Option<FetchError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl PageFetcher for MockPageFetcher {
    async fn fetch_page(
        &self,
        key: &DatasetKey,
        token: PageToken,
    ) -> Result<PageResult, FetchError> {
        let latency = *self.latency.read().await;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        self.fetches.write().await.push(RecordedFetch {
            dataset: key.storage_key(),
            page: token.value(),
        });

        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.pages
            .read()
            .await
            .get(&(key.storage_key(), token.value()))
            .cloned()
            .ok_or(FetchError::RemoteRejected { status: 404 })
    }
}
