//! Read API over the cached article list, consumed by the web and CLI surfaces.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use gzb_core::{
    AccountInfo, AccountSummary, CanonicalArticle, Category, HomeData, HomeStats, HomeSyncInfo,
    SyncInfo, CATEGORIES,
};
use gzb_ingest::{map_category, QualityThresholds};
use gzb_storage::{load_account_info, LoadedSnapshot, SnapshotError, SnapshotLocator, SnapshotSource};
use tracing::{info, warn};

use crate::cache::ArticleCache;
use crate::pipeline::{process_snapshot, BatchReport, ProcessedBatch};
use crate::SiteConfig;

/// Slice sizes for the home page blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HomeLayout {
    pub per_category: usize,
    pub featured: usize,
    pub latest: usize,
}

impl Default for HomeLayout {
    fn default() -> Self {
        Self {
            per_category: 3,
            featured: 6,
            latest: 12,
        }
    }
}

pub struct ArticleService {
    source: SnapshotSource,
    account_info: SnapshotLocator,
    cache: ArticleCache,
    thresholds: QualityThresholds,
    layout: HomeLayout,
    last_report: Mutex<Option<BatchReport>>,
}

impl ArticleService {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            source: SnapshotSource::new(SnapshotLocator::sync_results(
                &config.data_dir,
                config.known_snapshots.iter().cloned(),
            )),
            account_info: SnapshotLocator::account_info(&config.data_dir),
            cache: ArticleCache::new(config.cache_ttl),
            thresholds: QualityThresholds::default(),
            layout: HomeLayout::default(),
            last_report: Mutex::new(None),
        }
    }

    pub fn with_thresholds(mut self, thresholds: QualityThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_layout(mut self, layout: HomeLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn source(&self) -> &SnapshotSource {
        &self.source
    }

    pub fn account_info_locator(&self) -> &SnapshotLocator {
        &self.account_info
    }

    pub fn cache(&self) -> &ArticleCache {
        &self.cache
    }

    fn load_snapshot(&self) -> Option<LoadedSnapshot> {
        match self.source.load_latest() {
            Ok(loaded) => Some(loaded),
            Err(err @ SnapshotError::NotFound { .. }) => {
                warn!(%err, "no sync snapshot available");
                None
            }
            Err(err) => {
                warn!(%err, "sync snapshot unreadable, serving no data");
                None
            }
        }
    }

    /// Runs the full pipeline against the current snapshot, bypassing the cache.
    pub fn process_uncached(&self) -> Option<ProcessedBatch> {
        let loaded = self.load_snapshot()?;
        let batch = process_snapshot(&loaded.snapshot, &self.thresholds, Utc::now());
        *self
            .last_report
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(batch.report.clone());
        Some(batch)
    }

    pub fn last_report(&self) -> Option<BatchReport> {
        self.last_report
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    pub fn all_articles(&self) -> Arc<Vec<CanonicalArticle>> {
        self.cache
            .get_or_refresh(|| self.process_uncached().map(|batch| batch.articles))
    }

    pub fn articles_by_category(&self, category_id: &str) -> Vec<CanonicalArticle> {
        self.all_articles()
            .iter()
            .filter(|article| article.category_id == category_id)
            .cloned()
            .collect()
    }

    pub fn article_by_id(&self, id: &str) -> Option<CanonicalArticle> {
        self.all_articles().iter().find(|article| article.id == id).cloned()
    }

    /// Account profiles keyed by site category id. `None` when no account file exists
    /// or it cannot be parsed.
    pub fn account_info(&self) -> Option<BTreeMap<String, AccountInfo>> {
        let path = self.account_info.locate()?;
        match load_account_info(&path) {
            Ok(accounts) => Some(
                accounts
                    .into_iter()
                    .map(|account| (map_category(&account.category_id).as_str().to_string(), account))
                    .collect(),
            ),
            Err(err) => {
                warn!(error = %format!("{err:#}"), "account info unreadable");
                None
            }
        }
    }

    pub fn account_description(&self, category_id: &str) -> Option<String> {
        self.account_info()?
            .remove(category_id)?
            .principal_info
            .map(|principal| principal.desc)
            .filter(|desc| !desc.is_empty())
    }

    pub fn home_data(&self) -> HomeData {
        let articles = self.all_articles();

        let mut categorized: BTreeMap<String, Vec<CanonicalArticle>> = BTreeMap::new();
        for article in articles.iter() {
            let group = categorized.entry(article.category_id.clone()).or_default();
            if group.len() < self.layout.per_category {
                group.push(article.clone());
            }
        }

        let sync_info = self.load_snapshot().map(|loaded| HomeSyncInfo {
            last_sync: loaded
                .snapshot
                .account_results
                .first()
                .and_then(|account| account.articles.first())
                .and_then(|article| article.get("post_time_str"))
                .and_then(serde_json::Value::as_str)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string),
            total_accounts: loaded.snapshot.sync_stats.total_accounts,
            total_cost: loaded.snapshot.sync_stats.total_cost,
        });

        HomeData {
            featured_articles: articles.iter().take(self.layout.featured).cloned().collect(),
            latest_articles: articles.iter().take(self.layout.latest).cloned().collect(),
            stats: HomeStats {
                total_articles: articles.len(),
                total_reads: articles
                    .iter()
                    .fold(0u64, |acc, a| acc.saturating_add(a.read_count)),
                categories_count: categorized.len(),
            },
            categorized_articles: categorized,
            total_articles: articles.len(),
            account_info: self.account_info(),
            sync_info,
        }
    }

    pub fn sync_info(&self) -> Option<SyncInfo> {
        let loaded = self.load_snapshot()?;
        let accounts = loaded
            .snapshot
            .account_results
            .iter()
            .map(|account| AccountSummary {
                name: account.account_name.clone(),
                articles: account.articles.len(),
                errors: account.errors,
                cost: account.cost,
            })
            .collect();
        info!(path = %loaded.path.display(), "sync info requested");
        Some(SyncInfo {
            stats: loaded.snapshot.sync_stats,
            accounts,
            last_sync_file: loaded.path.display().to_string(),
            snapshot_sha256: loaded.sha256,
        })
    }

    /// The fixed taxonomy with the number of cached articles in each category.
    pub fn categories(&self) -> Vec<(&'static Category, usize)> {
        let articles = self.all_articles();
        CATEGORIES
            .iter()
            .map(|category| {
                let count = articles
                    .iter()
                    .filter(|article| article.category_id == category.slug)
                    .count();
                (category, count)
            })
            .collect()
    }
}
