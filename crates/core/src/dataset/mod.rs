//! Dataset identity for independently-paginated catalog collections.
//!
//! A [`DatasetKey`] names one pagination stream: media kind + scope + locale.
//! Two equal keys are the same stream and share a cursor and cache partition;
//! any field difference is a different stream.

use serde::{Deserialize, Serialize};

/// Kind of catalog media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    Tv,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Tv => "tv",
        }
    }
}

/// Sort order for discover-style datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    PopularityDesc,
    VoteAverageDesc,
    ReleaseDateDesc,
    ReleaseDateAsc,
}

impl SortBy {
    /// Wire value understood by the remote discover endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::PopularityDesc => "popularity.desc",
            SortBy::VoteAverageDesc => "vote_average.desc",
            SortBy::ReleaseDateDesc => "primary_release_date.desc",
            SortBy::ReleaseDateAsc => "primary_release_date.asc",
        }
    }
}

impl Default for SortBy {
    fn default() -> Self {
        SortBy::PopularityDesc
    }
}

/// Filter/sort criteria for discover datasets.
///
/// Criteria are normalized at construction (genre ids sorted and deduplicated)
/// so that logically equal criteria always compare, hash, and render equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiscoverCriteria {
    pub sort_by: SortBy,
    /// Genre ids, sorted ascending, no duplicates.
    #[serde(default)]
    pub genres: Vec<u16>,
    /// Release/first-air year filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    /// Minimum vote count filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_vote_count: Option<u32>,
}

impl DiscoverCriteria {
    pub fn new(sort_by: SortBy) -> Self {
        Self {
            sort_by,
            genres: Vec::new(),
            year: None,
            min_vote_count: None,
        }
    }

    /// Set genre filters. Ids are sorted and deduplicated.
    pub fn with_genres(mut self, mut genres: Vec<u16>) -> Self {
        genres.sort_unstable();
        genres.dedup();
        self.genres = genres;
        self
    }

    pub fn with_year(mut self, year: u16) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_min_vote_count(mut self, count: u32) -> Self {
        self.min_vote_count = Some(count);
        self
    }

    /// Canonical filter signature, stable across equal criteria.
    pub fn canonical(&self) -> String {
        let mut out = format!("sort={}", self.sort_by.as_str());
        if !self.genres.is_empty() {
            let genres: Vec<String> = self.genres.iter().map(|g| g.to_string()).collect();
            out.push_str(&format!("&genres={}", genres.join(",")));
        }
        if let Some(year) = self.year {
            out.push_str(&format!("&year={}", year));
        }
        if let Some(votes) = self.min_vote_count {
            out.push_str(&format!("&votes={}", votes));
        }
        out
    }
}

impl Default for DiscoverCriteria {
    fn default() -> Self {
        Self::new(SortBy::default())
    }
}

/// What slice of the remote catalog a dataset covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scope {
    Popular,
    TopRated,
    /// Upcoming movies / TV airing today.
    Upcoming,
    /// Titles similar to a given catalog entry.
    Similar { id: u64 },
    /// Criteria-driven discovery.
    Discover { criteria: DiscoverCriteria },
}

impl Scope {
    fn key_segment(&self) -> String {
        match self {
            Scope::Popular => "popular".to_string(),
            Scope::TopRated => "top_rated".to_string(),
            Scope::Upcoming => "upcoming".to_string(),
            Scope::Similar { id } => format!("similar-{}", id),
            Scope::Discover { criteria } => format!("discover?{}", criteria.canonical()),
        }
    }
}

/// Caching strategy for a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    /// Persisted across restarts, refreshed on staleness.
    Durable,
    /// In-memory only, dies with its coordinator.
    Ephemeral,
}

/// Identity of one independently-paginated collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetKey {
    pub media: MediaKind,
    pub scope: Scope,
    /// Locale/region code as sent to the remote, e.g. `en-US`.
    pub locale: String,
}

impl DatasetKey {
    pub fn new(media: MediaKind, scope: Scope, locale: impl Into<String>) -> Self {
        Self {
            media,
            scope,
            locale: locale.into().trim().to_string(),
        }
    }

    /// Partition discriminator used by every store.
    ///
    /// Equal keys always render the same string; any differing field yields a
    /// different string (criteria are canonicalized at construction).
    pub fn storage_key(&self) -> String {
        format!(
            "{}/{}/{}",
            self.media.as_str(),
            self.scope.key_segment(),
            self.locale
        )
    }

    /// Discover datasets are ephemeral; everything else is cached durably.
    pub fn cache_mode(&self) -> CacheMode {
        match self.scope {
            Scope::Discover { .. } => CacheMode::Ephemeral,
            _ => CacheMode::Durable,
        }
    }
}

impl std::fmt::Display for DatasetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.storage_key())
    }
}

/// Opaque pagination token.
///
/// Consumers only ever pass back tokens previously returned by the fetcher
/// (or [`PageToken::FIRST`]); the numeric payload is a fetcher implementation
/// detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageToken(u32);

impl PageToken {
    /// The first page of any dataset.
    pub const FIRST: PageToken = PageToken(1);

    pub fn new(page: u32) -> Self {
        Self(page)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}
