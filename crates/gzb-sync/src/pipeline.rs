//! One pass over a snapshot: quality filter, title dedup, normalization, ID dedup, ordering.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use gzb_core::{CanonicalArticle, SyncSnapshot};
use gzb_ingest::{check_publishable, normalize, CategoryMapping, QualityThresholds, Rejection};
use serde::Serialize;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use crate::dedup::DedupEngine;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub accounts: usize,
    pub raw_records: usize,
    pub published: usize,
    /// Records whose fields did not match the expected types.
    pub malformed_records: usize,
    pub rejected: BTreeMap<Rejection, usize>,
    pub duplicate_titles: usize,
    pub id_collisions: usize,
    /// Upstream tags kept verbatim as `category_id` because no mapping exists.
    pub unmapped_categories: BTreeMap<String, usize>,
}

impl BatchReport {
    fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            accounts: 0,
            raw_records: 0,
            published: 0,
            malformed_records: 0,
            rejected: BTreeMap::new(),
            duplicate_titles: 0,
            id_collisions: 0,
            unmapped_categories: BTreeMap::new(),
        }
    }

    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }
}

#[derive(Debug, Clone)]
pub struct ProcessedBatch {
    pub articles: Vec<CanonicalArticle>,
    pub report: BatchReport,
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Best-effort parse of the loosely formatted upstream publish time.
///
/// Offset-bearing times are converted to UTC; times without an offset are taken as UTC.
pub fn parse_publish_time(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Newest first; ties and unparseable times keep input order, the latter after all others.
pub fn sort_by_publish_time_desc(articles: &mut [CanonicalArticle]) {
    articles.sort_by_cached_key(|article| Reverse(parse_publish_time(&article.publish_time)));
}

pub fn process_snapshot(
    snapshot: &SyncSnapshot,
    thresholds: &QualityThresholds,
    processed_at: DateTime<Utc>,
) -> ProcessedBatch {
    let run_id = Uuid::new_v4();
    let span = info_span!("ingest_batch", %run_id, accounts = snapshot.account_results.len());
    let _guard = span.enter();

    let mut report = BatchReport::new(run_id);
    let mut dedup = DedupEngine::new();
    let mut articles = Vec::new();

    for account in &snapshot.account_results {
        report.accounts += 1;
        for (index, record) in account.records().enumerate() {
            report.raw_records += 1;

            let raw = match record {
                Ok(raw) => raw,
                Err(err) => {
                    debug!(account = %account.account_name, index, %err, "malformed record skipped");
                    report.malformed_records += 1;
                    continue;
                }
            };

            if let Err(reason) = check_publishable(&raw, thresholds) {
                debug!(account = %account.account_name, index, %reason, "record rejected");
                *report.rejected.entry(reason).or_default() += 1;
                continue;
            }

            let title = raw.title.as_deref().unwrap_or_default();
            if !dedup.claim_title(title) {
                debug!(account = %account.account_name, index, title, "duplicate title dropped");
                report.duplicate_titles += 1;
                continue;
            }

            let normalized = normalize(&raw, &account.account_name, index, processed_at);
            if let CategoryMapping::Unmapped(tag) = &normalized.category {
                *report.unmapped_categories.entry(tag.clone()).or_default() += 1;
            }

            let mut article = normalized.article;
            let claim = dedup.claim_id(std::mem::take(&mut article.id));
            if claim.collided {
                debug!(id = %claim.id, "article id collision resolved");
                report.id_collisions += 1;
            }
            article.id = claim.id;
            articles.push(article);
        }
    }

    sort_by_publish_time_desc(&mut articles);
    report.published = articles.len();

    for (tag, count) in &report.unmapped_categories {
        warn!(tag = %tag, count, "category tag outside taxonomy kept as-is");
    }
    info!(
        raw_records = report.raw_records,
        published = report.published,
        malformed = report.malformed_records,
        rejected = report.rejected_total(),
        duplicate_titles = report.duplicate_titles,
        id_collisions = report.id_collisions,
        "batch processed"
    );

    ProcessedBatch { articles, report }
}
