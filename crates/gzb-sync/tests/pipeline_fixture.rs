use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use gzb_ingest::{QualityThresholds, Rejection};
use gzb_storage::load_snapshot;
use gzb_sync::{process_snapshot, ArticleService, SiteConfig};

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../fixtures/snapshots")
}

fn fixture_service() -> ArticleService {
    ArticleService::new(&SiteConfig::for_data_dir(fixture_dir()).with_cache_ttl(Duration::from_secs(120)))
}

#[test]
fn fixture_snapshot_produces_expected_articles_in_order() {
    let svc = fixture_service();
    let articles = svc.all_articles();
    let ids: Vec<_> = articles.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["abc123_", "XyZ98765_", "_2_测试文章标题示例", "_2_正名与名实之辨"]
    );

    let first = &articles[0];
    assert_eq!(first.title, "春江花月夜新解");
    assert_eq!(first.category_id, "literary");
    assert_eq!(first.publish_time, "2025-09-12 09:30:00");
    assert!(first.summary.ends_with("..."));

    assert_eq!(articles[1].category_id, "debate");
    assert_eq!(articles[3].category_id, "zhengming");
}

#[test]
fn fixture_report_accounts_for_every_raw_record() {
    let svc = fixture_service();
    let batch = svc.process_uncached().expect("fixture snapshot present");
    let report = batch.report;
    assert_eq!(report.accounts, 2);
    assert_eq!(report.raw_records, 7);
    assert_eq!(report.published, 4);
    assert_eq!(report.duplicate_titles, 1);
    assert_eq!(report.id_collisions, 0);
    assert_eq!(report.rejected.get(&Rejection::FetchFailed), Some(&1));
    assert_eq!(report.rejected.get(&Rejection::TextTooShort), Some(&1));
    assert_eq!(report.unmapped_categories.get("zhengming"), Some(&1));
    assert_eq!(
        report.raw_records,
        report.published + report.rejected_total() + report.duplicate_titles + report.malformed_records
    );
    assert_eq!(report.malformed_records, 0);
    assert_eq!(svc.last_report().map(|r| r.run_id), Some(report.run_id));
}

#[test]
fn duplicate_title_keeps_first_in_account_order() {
    let articles = fixture_service().all_articles();
    let kept: Vec<_> = articles
        .iter()
        .filter(|a| a.title == "春江花月夜新解")
        .collect();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].id, "abc123_");
}

#[test]
fn output_ids_and_titles_are_unique() {
    let articles = fixture_service().all_articles();
    let ids: HashSet<_> = articles.iter().map(|a| &a.id).collect();
    let titles: HashSet<_> = articles.iter().map(|a| &a.title).collect();
    assert_eq!(ids.len(), articles.len());
    assert_eq!(titles.len(), articles.len());
}

#[test]
fn pipeline_is_idempotent_over_unchanged_snapshot() {
    let loaded = load_snapshot(fixture_dir().join("sync_results_20250915_140611.json")).expect("load");
    let at = Utc.with_ymd_and_hms(2025, 9, 15, 16, 0, 0).single().unwrap();
    let first = process_snapshot(&loaded.snapshot, &QualityThresholds::default(), at);
    let second = process_snapshot(&loaded.snapshot, &QualityThresholds::default(), at);
    assert_eq!(first.articles, second.articles);
    assert_ne!(first.report.run_id, second.report.run_id);
}

#[test]
fn derived_views_over_fixture() {
    let svc = fixture_service();
    assert_eq!(svc.articles_by_category("literary").len(), 2);
    assert_eq!(svc.articles_by_category("music").len(), 0);
    assert_eq!(
        svc.article_by_id("XyZ98765_").map(|a| a.title),
        Some("论辩之道第一讲义".to_string())
    );
    assert!(svc.article_by_id("nope").is_none());
    assert_eq!(svc.account_description("debate").as_deref(), Some("辩论明理"));

    let home = svc.home_data();
    assert_eq!(home.total_articles, 4);
    assert_eq!(home.featured_articles.len(), 4);
    assert_eq!(
        home.sync_info.and_then(|s| s.last_sync).as_deref(),
        Some("2025-09-12 09:30:00")
    );
    assert_eq!(home.account_info.map(|m| m.len()), Some(2));

    let sync = svc.sync_info().expect("sync info");
    assert_eq!(sync.stats.total_accounts, 2);
    assert_eq!(sync.accounts[1].name, "高瞻的論正人生");
    assert_eq!(sync.accounts[1].articles, 3);
    assert_eq!(sync.accounts[1].errors, 1);
}

#[test]
fn missing_data_directory_serves_empty_listings() {
    let dir = tempfile::tempdir().expect("tempdir");
    let svc = ArticleService::new(&SiteConfig::for_data_dir(dir.path()));
    assert!(svc.all_articles().is_empty());
    assert_eq!(svc.home_data().total_articles, 0);
}
