//! Snapshot-to-site article pipeline: dedup, ordering, caching and read views.

use std::path::PathBuf;
use std::time::Duration;

use gzb_storage::DEFAULT_KNOWN_SNAPSHOTS;

pub mod cache;
pub mod dedup;
pub mod pipeline;
pub mod service;

pub use cache::ArticleCache;
pub use dedup::{DedupEngine, IdClaim};
pub use pipeline::{
    parse_publish_time, process_snapshot, sort_by_publish_time_desc, BatchReport, ProcessedBatch,
};
pub use service::{ArticleService, HomeLayout};

pub const CRATE_NAME: &str = "gzb-sync";

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub data_dir: PathBuf,
    pub cache_ttl: Duration,
    pub known_snapshots: Vec<String>,
}

impl SiteConfig {
    pub fn from_env() -> Self {
        Self {
            data_dir: std::env::var("GZB_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
            cache_ttl: std::env::var("GZB_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_CACHE_TTL),
            known_snapshots: std::env::var("GZB_KNOWN_SNAPSHOTS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(ToString::to_string)
                        .collect()
                })
                .unwrap_or_else(|_| default_known_snapshots()),
        }
    }

    pub fn for_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            cache_ttl: DEFAULT_CACHE_TTL,
            known_snapshots: default_known_snapshots(),
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }
}

fn default_known_snapshots() -> Vec<String> {
    DEFAULT_KNOWN_SNAPSHOTS.iter().map(|s| s.to_string()).collect()
}
