//! Remote catalog page fetching.
//!
//! The fetcher is a pure capability: it retrieves one page of records for a
//! dataset key and a page cursor, and has no side effects beyond the network
//! call. It never touches the cache.

mod tmdb;
mod types;

pub use tmdb::{TmdbConfig, TmdbFetcher};
pub use types::{CatalogRecord, PageResult};

use async_trait::async_trait;
use thiserror::Error;

use crate::dataset::{DatasetKey, PageToken};

/// Page size of the remote list endpoints. Fixed by the remote API, not
/// configurable by callers.
pub const LIST_PAGE_SIZE: u32 = 20;

/// Errors that can occur when fetching a remote page.
///
/// Variants carry strings rather than backend error types so the error can be
/// cloned into coordinator state snapshots.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Transient transport failure (DNS, timeout, connection reset).
    /// Retryable on the next consumer-driven trigger.
    #[error("network error: {0}")]
    Network(String),

    /// The remote answered with a failure status. Not retried automatically.
    #[error("remote rejected request: HTTP {status}")]
    RemoteRejected { status: u16 },

    /// The response body did not match the expected shape. Permanent for
    /// that page.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Client not configured (missing API key, etc.).
    #[error("fetcher not configured: {0}")]
    NotConfigured(String),
}

impl FetchError {
    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_decode() {
            FetchError::Malformed(e.to_string())
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// Capability to fetch one page of a dataset from the remote catalog.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the page identified by `token` for `key`.
    ///
    /// `token` is either [`PageToken::FIRST`] or a token previously returned
    /// in a [`PageResult`] for the same key.
    async fn fetch_page(&self, key: &DatasetKey, token: PageToken)
        -> Result<PageResult, FetchError>;
}
