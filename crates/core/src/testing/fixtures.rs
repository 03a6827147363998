//! Record and dataset fixtures for tests.

use crate::dataset::{DatasetKey, MediaKind, Scope};
use crate::remote::CatalogRecord;

/// A movie record with deterministic display fields.
pub fn movie_record(id: u64) -> CatalogRecord {
    CatalogRecord {
        id,
        media: MediaKind::Movie,
        title: format!("Movie {}", id),
        overview: Some(format!("Overview of movie {}", id)),
        poster_path: Some(format!("/posters/{}.jpg", id)),
        backdrop_path: None,
        release_date: Some("2020-06-15".to_string()),
        vote_average: Some(7.0),
        vote_count: Some(500),
    }
}

/// A TV series record with deterministic display fields.
pub fn tv_record(id: u64) -> CatalogRecord {
    CatalogRecord {
        id,
        media: MediaKind::Tv,
        title: format!("Series {}", id),
        overview: Some(format!("Overview of series {}", id)),
        poster_path: Some(format!("/posters/tv-{}.jpg", id)),
        backdrop_path: None,
        release_date: Some("2019-01-10".to_string()),
        vote_average: Some(8.0),
        vote_count: Some(1200),
    }
}

/// One page worth of movie records for the given ids.
pub fn movie_page(ids: &[u64]) -> Vec<CatalogRecord> {
    ids.iter().map(|id| movie_record(*id)).collect()
}

pub fn popular_movies(locale: &str) -> DatasetKey {
    DatasetKey::new(MediaKind::Movie, Scope::Popular, locale)
}

pub fn popular_tv(locale: &str) -> DatasetKey {
    DatasetKey::new(MediaKind::Tv, Scope::Popular, locale)
}
