//! Snapshot discovery and loading for the flat-file content store.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use gzb_core::{AccountInfo, SyncSnapshot};
use serde::{de::DeserializeOwned, Deserialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info};

pub const CRATE_NAME: &str = "gzb-storage";

pub const SNAPSHOT_PREFIX: &str = "sync_results_";
pub const ACCOUNT_INFO_PREFIX: &str = "account_info_";
pub const JSON_SUFFIX: &str = ".json";

/// Filenames probed before any directory listing, for hosts where `read_dir` is denied.
pub const DEFAULT_KNOWN_SNAPSHOTS: &[&str] = &[
    "sync_results_20250915_140611_with_content_with_content_20250915_150117.json",
    "sync_results_20250915_140611_with_content_backup.json",
    "sync_results_20250915_140611_with_content.json",
    "sync_results_20250915_140611.json",
];

pub const DEFAULT_KNOWN_ACCOUNT_INFO: &[&str] = &["account_info_20250915_151039.json"];

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("no snapshot file found under {}", .dir.display())]
    NotFound { dir: PathBuf },
    #[error("reading snapshot {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing snapshot {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One way of resolving a file inside the data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupStrategy {
    /// First listed name that exists wins; list order is priority order.
    KnownFiles(Vec<String>),
    /// Lexicographically greatest `{prefix}*{suffix}` regular file.
    DirectoryScan { prefix: String, suffix: String },
}

impl LookupStrategy {
    pub fn known_files<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::KnownFiles(names.into_iter().map(Into::into).collect())
    }

    pub fn directory_scan(prefix: impl Into<String>) -> Self {
        Self::DirectoryScan {
            prefix: prefix.into(),
            suffix: JSON_SUFFIX.to_string(),
        }
    }

    pub fn resolve(&self, dir: &Path) -> Option<PathBuf> {
        match self {
            Self::KnownFiles(names) => names
                .iter()
                .map(|name| dir.join(name))
                .find(|path| path.is_file()),
            Self::DirectoryScan { prefix, suffix } => {
                let entries = match fs::read_dir(dir) {
                    Ok(entries) => entries,
                    Err(err) => {
                        debug!(dir = %dir.display(), %err, "directory scan unavailable");
                        return None;
                    }
                };
                entries
                    .filter_map(|entry| entry.ok())
                    .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
                    .filter_map(|entry| entry.file_name().into_string().ok())
                    .filter(|name| name.starts_with(prefix.as_str()) && name.ends_with(suffix.as_str()))
                    .max()
                    .map(|name| dir.join(name))
            }
        }
    }
}

/// Ordered strategy chain over one directory; the first strategy that resolves wins.
#[derive(Debug, Clone)]
pub struct SnapshotLocator {
    dir: PathBuf,
    strategies: Vec<LookupStrategy>,
}

impl SnapshotLocator {
    pub fn new(dir: impl Into<PathBuf>, strategies: Vec<LookupStrategy>) -> Self {
        Self {
            dir: dir.into(),
            strategies,
        }
    }

    pub fn sync_results<I, S>(dir: impl Into<PathBuf>, known_files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            dir,
            vec![
                LookupStrategy::known_files(known_files),
                LookupStrategy::directory_scan(SNAPSHOT_PREFIX),
            ],
        )
    }

    pub fn account_info(dir: impl Into<PathBuf>) -> Self {
        Self::new(
            dir,
            vec![
                LookupStrategy::known_files(DEFAULT_KNOWN_ACCOUNT_INFO.iter().copied()),
                LookupStrategy::directory_scan(ACCOUNT_INFO_PREFIX),
            ],
        )
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn strategies(&self) -> &[LookupStrategy] {
        &self.strategies
    }

    pub fn locate(&self) -> Option<PathBuf> {
        let found = self
            .strategies
            .iter()
            .find_map(|strategy| strategy.resolve(&self.dir));
        match &found {
            Some(path) => debug!(path = %path.display(), "located data file"),
            None => debug!(dir = %self.dir.display(), "no data file matched"),
        }
        found
    }
}

#[derive(Debug, Clone)]
pub struct LoadedSnapshot {
    pub path: PathBuf,
    pub sha256: String,
    pub snapshot: SyncSnapshot,
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

pub fn load_snapshot(path: impl AsRef<Path>) -> Result<LoadedSnapshot, SnapshotError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| SnapshotError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let snapshot: SyncSnapshot =
        serde_json::from_slice(&bytes).map_err(|source| SnapshotError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    info!(
        path = %path.display(),
        accounts = snapshot.account_results.len(),
        "loaded sync snapshot"
    );
    Ok(LoadedSnapshot {
        path: path.to_path_buf(),
        sha256: sha256_hex(&bytes),
        snapshot,
    })
}

/// Locates and reads the live snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    locator: SnapshotLocator,
}

impl SnapshotSource {
    pub fn new(locator: SnapshotLocator) -> Self {
        Self { locator }
    }

    pub fn locator(&self) -> &SnapshotLocator {
        &self.locator
    }

    pub fn load_latest(&self) -> Result<LoadedSnapshot, SnapshotError> {
        let path = self.locator.locate().ok_or_else(|| SnapshotError::NotFound {
            dir: self.locator.dir().to_path_buf(),
        })?;
        load_snapshot(path)
    }
}

#[derive(Debug, Deserialize)]
struct AccountInfoFile {
    #[serde(default)]
    account_info: Vec<AccountInfo>,
}

fn read_json_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let path = path.as_ref();
    let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))
}

pub fn load_account_info(path: impl AsRef<Path>) -> anyhow::Result<Vec<AccountInfo>> {
    let file: AccountInfoFile = read_json_file(path)?;
    Ok(file.account_info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).expect("write fixture");
    }

    #[test]
    fn snapshot_hashing_is_stable() {
        assert_eq!(
            sha256_hex(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn directory_scan_picks_lexicographically_greatest_match() {
        let dir = tempdir().expect("tempdir");
        touch(dir.path(), "sync_results_20250101_000000.json", "{}");
        touch(dir.path(), "sync_results_20250915_140611.json", "{}");
        touch(dir.path(), "sync_results_20250301_120000.json", "{}");
        touch(dir.path(), "sync_results_20991231_000000.txt", "{}");
        touch(dir.path(), "account_info_20991231_000000.json", "{}");
        fs::create_dir(dir.path().join("sync_results_99999999.json")).expect("mkdir");

        let found = LookupStrategy::directory_scan(SNAPSHOT_PREFIX).resolve(dir.path());
        assert_eq!(found, Some(dir.path().join("sync_results_20250915_140611.json")));
    }

    #[test]
    fn known_files_win_over_directory_scan_in_list_order() {
        let dir = tempdir().expect("tempdir");
        touch(dir.path(), "sync_results_20250915_140611.json", "{}");
        touch(dir.path(), "sync_results_20250915_140611_with_content.json", "{}");
        touch(dir.path(), "sync_results_20300101_000000.json", "{}");

        let locator = SnapshotLocator::sync_results(dir.path(), DEFAULT_KNOWN_SNAPSHOTS.iter().copied());
        assert_eq!(
            locator.locate(),
            Some(dir.path().join("sync_results_20250915_140611_with_content.json"))
        );
    }

    #[test]
    fn falls_through_to_scan_when_no_known_file_exists() {
        let dir = tempdir().expect("tempdir");
        touch(dir.path(), "sync_results_20300101_000000.json", "{}");
        let locator = SnapshotLocator::sync_results(dir.path(), ["missing.json"]);
        assert_eq!(
            locator.locate(),
            Some(dir.path().join("sync_results_20300101_000000.json"))
        );
    }

    #[test]
    fn missing_directory_is_not_found_rather_than_error() {
        let dir = tempdir().expect("tempdir");
        let source = SnapshotSource::new(SnapshotLocator::sync_results(
            dir.path().join("does-not-exist"),
            DEFAULT_KNOWN_SNAPSHOTS.iter().copied(),
        ));
        assert!(matches!(source.load_latest(), Err(SnapshotError::NotFound { .. })));
    }

    #[test]
    fn invalid_json_surfaces_parse_error() {
        let dir = tempdir().expect("tempdir");
        touch(dir.path(), "sync_results_20250101_000000.json", "{not json");
        let source = SnapshotSource::new(SnapshotLocator::sync_results(dir.path(), Vec::<String>::new()));
        assert!(matches!(source.load_latest(), Err(SnapshotError::Parse { .. })));
    }

    #[test]
    fn loads_snapshot_with_fingerprint() {
        let dir = tempdir().expect("tempdir");
        let body = r#"{"sync_stats":{"total_accounts":1,"total_cost":0.5},"account_results":[{"account_name":"a","articles":[{"title":"t"}]}]}"#;
        touch(dir.path(), "sync_results_20250101_000000.json", body);
        let loaded = SnapshotSource::new(SnapshotLocator::sync_results(dir.path(), Vec::<String>::new()))
            .load_latest()
            .expect("load");
        assert_eq!(loaded.sha256, sha256_hex(body.as_bytes()));
        assert_eq!(loaded.snapshot.sync_stats.total_accounts, 1);
        assert_eq!(loaded.snapshot.account_results[0].articles.len(), 1);
    }

    #[test]
    fn account_info_file_parses_principal_desc() {
        let dir = tempdir().expect("tempdir");
        touch(
            dir.path(),
            "account_info_20250915_151039.json",
            r#"{"fetch_time":"x","account_info":[{"name":"n","biz":"b","category_id":"politics","category_name":"c","principal_info":{"desc":"about"}}]}"#,
        );
        let path = SnapshotLocator::account_info(dir.path()).locate().expect("located");
        let infos = load_account_info(path).expect("parse");
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].principal_info.as_ref().map(|p| p.desc.as_str()), Some("about"));
    }
}
