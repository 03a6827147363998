//! Normalized types returned by remote page fetches.

use serde::{Deserialize, Serialize};

use crate::dataset::{MediaKind, PageToken};

/// One normalized catalog entry (movie or TV series).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogRecord {
    /// Stable remote id, unique within a media-kind namespace.
    pub id: u64,
    /// Whether this is a movie or a TV series.
    pub media: MediaKind,
    /// Display title (series name for TV).
    pub title: String,
    /// Overview/synopsis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    /// Poster path (relative to the image base URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    /// Backdrop path (relative to the image base URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_path: Option<String>,
    /// Release date for movies, first air date for TV (YYYY-MM-DD).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    /// Average vote (0-10).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f32>,
    /// Number of votes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_count: Option<u32>,
}

impl CatalogRecord {
    /// Release/first-air year, if a date is present.
    pub fn year(&self) -> Option<u32> {
        self.release_date
            .as_ref()
            .and_then(|d| d.split('-').next())
            .and_then(|y| y.parse().ok())
    }
}

/// One fetched page of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    /// Records in remote page order.
    pub records: Vec<CatalogRecord>,
    /// Token for the successor page; `None` means the dataset is exhausted.
    pub next_page: Option<PageToken>,
}

impl PageResult {
    pub fn has_next_page(&self) -> bool {
        self.next_page.is_some()
    }
}
