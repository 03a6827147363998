use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use crate::remote::TmdbConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub tmdb: TmdbConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Local cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Path of the catalog cache database.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    /// Staleness horizon: durable datasets older than this are refreshed on
    /// subscribe.
    #[serde(default = "default_stale_after_minutes")]
    pub stale_after_minutes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            stale_after_minutes: default_stale_after_minutes(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("marquee.db")
}

fn default_stale_after_minutes() -> u64 {
    24 * 60
}
