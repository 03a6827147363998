//! TMDB (The Movie Database) page fetcher.
//!
//! Maps dataset keys onto TMDB REST endpoints and normalizes paged responses.
//! TMDB requires an API key; rate limits are generous (around 40 requests per
//! second) so no client-side throttling is applied here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{CatalogRecord, PageResult};
use super::{FetchError, PageFetcher};
use crate::dataset::{DatasetKey, MediaKind, PageToken, Scope};

/// TMDB fetcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbConfig {
    /// TMDB API key (required).
    pub api_key: String,
    /// Base URL (default: https://api.themoviedb.org/3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Image base URL for posters/backdrops.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base_url: Option<String>,
}

/// TMDB-backed [`PageFetcher`].
pub struct TmdbFetcher {
    client: Client,
    base_url: String,
    api_key: String,
    #[allow(dead_code)]
    image_base_url: String,
}

impl TmdbFetcher {
    pub fn new(config: TmdbConfig) -> Result<Self, FetchError> {
        if config.api_key.is_empty() {
            return Err(FetchError::NotConfigured(
                "TMDB API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(FetchError::from_reqwest)?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| "https://api.themoviedb.org/3".to_string());

        let image_base_url = config
            .image_base_url
            .unwrap_or_else(|| "https://image.tmdb.org/t/p".to_string());

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
            image_base_url,
        })
    }

    /// Endpoint path and extra query parameters for a dataset key.
    ///
    /// This is the dataset-key-to-endpoint table: which REST path and query
    /// parameters correspond to which scope. `Upcoming` maps to the closest
    /// TV equivalent (`airing_today`) since TMDB has no upcoming-TV list.
    fn endpoint(&self, key: &DatasetKey) -> (String, Vec<(String, String)>) {
        let media = key.media.as_str();
        match &key.scope {
            Scope::Popular => (format!("/{}/popular", media), vec![]),
            Scope::TopRated => (format!("/{}/top_rated", media), vec![]),
            Scope::Upcoming => match key.media {
                MediaKind::Movie => ("/movie/upcoming".to_string(), vec![]),
                MediaKind::Tv => ("/tv/airing_today".to_string(), vec![]),
            },
            Scope::Similar { id } => (format!("/{}/{}/similar", media, id), vec![]),
            Scope::Discover { criteria } => {
                let mut query = vec![("sort_by".to_string(), criteria.sort_by.as_str().to_string())];
                if !criteria.genres.is_empty() {
                    let genres: Vec<String> =
                        criteria.genres.iter().map(|g| g.to_string()).collect();
                    query.push(("with_genres".to_string(), genres.join(",")));
                }
                if let Some(year) = criteria.year {
                    let param = match key.media {
                        MediaKind::Movie => "primary_release_year",
                        MediaKind::Tv => "first_air_date_year",
                    };
                    query.push((param.to_string(), year.to_string()));
                }
                if let Some(votes) = criteria.min_vote_count {
                    query.push(("vote_count.gte".to_string(), votes.to_string()));
                }
                (format!("/discover/{}", media), query)
            }
        }
    }

    async fn fetch_raw(
        &self,
        key: &DatasetKey,
        token: PageToken,
    ) -> Result<reqwest::Response, FetchError> {
        let (path, extra_query) = self.endpoint(key);
        let url = format!("{}{}", self.base_url, path);

        debug!("TMDB page fetch: {} page={}", key, token.value());

        let mut request = self.client.get(&url).query(&[
            ("api_key", self.api_key.as_str()),
            ("language", key.locale.as_str()),
            ("page", &token.value().to_string()),
        ]);
        for (name, value) in &extra_query {
            request = request.query(&[(name.as_str(), value.as_str())]);
        }

        let response = request.send().await.map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::RemoteRejected {
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl PageFetcher for TmdbFetcher {
    async fn fetch_page(
        &self,
        key: &DatasetKey,
        token: PageToken,
    ) -> Result<PageResult, FetchError> {
        let response = self.fetch_raw(key, token).await?;

        match key.media {
            MediaKind::Movie => {
                let page: TmdbPage<TmdbMovieRow> = response.json().await.map_err(|e| {
                    FetchError::Malformed(format!("failed to parse movie page: {}", e))
                })?;
                Ok(page.into_result(MediaKind::Movie))
            }
            MediaKind::Tv => {
                let page: TmdbPage<TmdbTvRow> = response.json().await.map_err(|e| {
                    FetchError::Malformed(format!("failed to parse TV page: {}", e))
                })?;
                Ok(page.into_result(MediaKind::Tv))
            }
        }
    }
}

// ============================================================================
// TMDB API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct TmdbPage<T> {
    page: u32,
    total_pages: u32,
    results: Vec<T>,
}

impl<T: Into<RowFields>> TmdbPage<T> {
    fn into_result(self, media: MediaKind) -> PageResult {
        let next_page = if self.page < self.total_pages {
            Some(PageToken::new(self.page + 1))
        } else {
            None
        };

        let records = self
            .results
            .into_iter()
            .map(|row| {
                let fields: RowFields = row.into();
                CatalogRecord {
                    id: fields.id,
                    media,
                    title: fields.title,
                    overview: fields.overview,
                    poster_path: fields.poster_path,
                    backdrop_path: fields.backdrop_path,
                    release_date: fields.release_date,
                    vote_average: fields.vote_average,
                    vote_count: fields.vote_count,
                }
            })
            .collect();

        PageResult { records, next_page }
    }
}

/// Common fields extracted from either row shape.
struct RowFields {
    id: u64,
    title: String,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    release_date: Option<String>,
    vote_average: Option<f32>,
    vote_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieRow {
    id: u64,
    title: String,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    release_date: Option<String>,
    vote_average: Option<f32>,
    vote_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TmdbTvRow {
    id: u64,
    name: String,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    first_air_date: Option<String>,
    vote_average: Option<f32>,
    vote_count: Option<u32>,
}

impl From<TmdbMovieRow> for RowFields {
    fn from(r: TmdbMovieRow) -> Self {
        Self {
            id: r.id,
            title: r.title,
            overview: r.overview,
            poster_path: r.poster_path,
            backdrop_path: r.backdrop_path,
            release_date: r.release_date,
            vote_average: r.vote_average,
            vote_count: r.vote_count,
        }
    }
}

impl From<TmdbTvRow> for RowFields {
    fn from(r: TmdbTvRow) -> Self {
        Self {
            id: r.id,
            title: r.name,
            overview: r.overview,
            poster_path: r.poster_path,
            backdrop_path: r.backdrop_path,
            release_date: r.first_air_date,
            vote_average: r.vote_average,
            vote_count: r.vote_count,
        }
    }
}
