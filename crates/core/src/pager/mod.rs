//! Demand-driven paging over the remote catalog.
//!
//! The coordinator turns the externally paged, rate-limited remote API into a
//! locally cached, resumable, deduplicated sequence. Consumers only ever see
//! a [`PagedView`]; the rendering layer signals approaching-boundary through
//! `window` calls and never drives the coordinator directly.

mod coordinator;
mod policy;
mod registry;
mod view;

pub use coordinator::{LoadState, PageCoordinator};
pub use policy::RefreshPolicy;
pub use registry::PagerRegistry;
pub use view::PagedView;

use thiserror::Error;

use crate::remote::FetchError;
use crate::store::StoreError;

/// Errors surfaced by the paging subsystem.
#[derive(Debug, Clone, Error)]
pub enum PagerError {
    /// Remote page fetch failed. Retryable via the next consumer trigger
    /// (scroll or refresh); never retried automatically.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Local durable store failed. Fatal for the subscription: neither reads
    /// nor writes can proceed safely.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl PagerError {
    /// Whether this error terminates the subscription.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PagerError::Storage(_))
    }
}
