//! Core data model and fixed site taxonomy for the blog content pipeline.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const CRATE_NAME: &str = "gzb-core";

/// One article as written to a sync snapshot by the upstream monitoring job.
///
/// Every field is optional on the wire; the snapshot writer omits keys freely and
/// the quality filter decides what is publishable.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawArticleRecord {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub original_url: Option<String>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub post_time_str: Option<String>,
    #[serde(default)]
    pub send_to_fans_num: Option<u64>,
    #[serde(default)]
    pub wechat_article_id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub content_html: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    /// Upstream free-form category tag, mapped onto [`CategoryId`] during normalization.
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub fetch_success: Option<bool>,
    #[serde(default)]
    pub fetch_error: Option<String>,
    #[serde(default)]
    pub fetch_cost: Option<f64>,
    #[serde(default)]
    pub fetch_time: Option<String>,
}

impl RawArticleRecord {
    /// HTML content when present and non-empty, else plain content, else `""`.
    pub fn preferred_content(&self) -> &str {
        self.content_html
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.content.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AccountResult {
    pub account_name: String,
    #[serde(default)]
    pub total_articles: u64,
    #[serde(default)]
    pub new_articles: u64,
    #[serde(default)]
    pub errors: u64,
    #[serde(default)]
    pub cost: f64,
    /// Kept as raw JSON so one mistyped record cannot fail the whole snapshot;
    /// see [`AccountResult::records`].
    #[serde(default)]
    pub articles: Vec<serde_json::Value>,
}

impl AccountResult {
    /// Each record converted on its own, in snapshot order.
    pub fn records(
        &self,
    ) -> impl Iterator<Item = Result<RawArticleRecord, serde_json::Error>> + '_ {
        self.articles
            .iter()
            .map(RawArticleRecord::deserialize)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SyncStats {
    #[serde(default)]
    pub total_accounts: u64,
    #[serde(default)]
    pub total_articles: u64,
    #[serde(default)]
    pub new_articles: u64,
    #[serde(default)]
    pub updated_articles: u64,
    #[serde(default)]
    pub errors: u64,
    #[serde(default)]
    pub total_cost: f64,
}

/// Point-in-time output of one external sync run (`sync_results_<timestamp>.json`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SyncSnapshot {
    #[serde(default)]
    pub sync_stats: SyncStats,
    #[serde(default)]
    pub account_results: Vec<AccountResult>,
    #[serde(default)]
    pub duration: Option<f64>,
}

/// Site-facing article, de-duplicated and category-mapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalArticle {
    pub id: String,
    pub title: String,
    pub content: String,
    pub summary: String,
    /// A [`CategoryId`] slug, or the raw upstream tag when it had no mapping.
    pub category_id: String,
    pub cover_image: String,
    pub publish_time: String,
    pub original_link: Option<String>,
    pub read_count: u64,
    pub is_featured: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryId {
    Literary,
    Math,
    Wisdom,
    Trading,
    Consulting,
    Tax,
    Music,
    Debate,
}

impl CategoryId {
    pub const ALL: [CategoryId; 8] = [
        CategoryId::Literary,
        CategoryId::Math,
        CategoryId::Wisdom,
        CategoryId::Trading,
        CategoryId::Consulting,
        CategoryId::Tax,
        CategoryId::Music,
        CategoryId::Debate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Literary => "literary",
            Self::Math => "math",
            Self::Wisdom => "wisdom",
            Self::Trading => "trading",
            Self::Consulting => "consulting",
            Self::Tax => "tax",
            Self::Music => "music",
            Self::Debate => "debate",
        }
    }

    pub fn category(self) -> &'static Category {
        &CATEGORIES[self as usize]
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category id `{}`", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for CategoryId {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Static taxonomy record consumed by the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: &'static str,
    pub slug: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
}

/// Ordered the same as [`CategoryId::ALL`].
pub static CATEGORIES: [Category; 8] = [
    Category {
        id: CategoryId::Literary,
        name: "高瞻的文艺人生",
        slug: "literary",
        color: "amber-700",
        icon: "fas fa-feather-alt",
        description: "诗词歌赋，琴棋书画，文人雅士之风流",
    },
    Category {
        id: CategoryId::Math,
        name: "高瞻的数术人生",
        slug: "math",
        color: "blue-700",
        icon: "fas fa-square-root-alt",
        description: "阴阳五行，奇门遁甲，数术玄机之奥秘",
    },
    Category {
        id: CategoryId::Wisdom,
        name: "高瞻的智慧人生",
        slug: "wisdom",
        color: "purple-700",
        icon: "fas fa-lightbulb",
        description: "处世哲学，人生智慧，明心见性之真谛",
    },
    Category {
        id: CategoryId::Trading,
        name: "高瞻的交易人生",
        slug: "trading",
        color: "green-700",
        icon: "fas fa-coins",
        description: "商场如战场，交易似博弈",
    },
    Category {
        id: CategoryId::Consulting,
        name: "高瞻的咨询人生",
        slug: "consulting",
        color: "red-700",
        icon: "fas fa-comments",
        description: "答疑解惑，指点迷津",
    },
    Category {
        id: CategoryId::Tax,
        name: "高瞻的税筹人生",
        slug: "tax",
        color: "indigo-700",
        icon: "fas fa-file-invoice-dollar",
        description: "财税之道，精打细算",
    },
    Category {
        id: CategoryId::Music,
        name: "高瞻的音乐人生",
        slug: "music",
        color: "orange-700",
        icon: "fas fa-music",
        description: "音律和谐，天籁之音",
    },
    Category {
        id: CategoryId::Debate,
        name: "高瞻的論正人生",
        slug: "debate",
        color: "gray-700",
        icon: "fas fa-balance-scale",
        description: "辩论明理，论证求真",
    },
];

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PrincipalInfo {
    #[serde(default)]
    pub wx_id: String,
    #[serde(default)]
    pub owner_name: String,
    #[serde(default)]
    pub verify_status: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub service_phone: String,
    #[serde(default)]
    pub last_login_country: String,
    #[serde(default)]
    pub last_login_province: String,
}

/// Public-account profile from `account_info_<timestamp>.json`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AccountInfo {
    pub name: String,
    #[serde(default)]
    pub biz: String,
    pub category_id: String,
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub principal_info: Option<PrincipalInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeSyncInfo {
    pub last_sync: Option<String>,
    pub total_accounts: u64,
    pub total_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HomeStats {
    pub total_articles: usize,
    pub total_reads: u64,
    pub categories_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeData {
    pub featured_articles: Vec<CanonicalArticle>,
    pub latest_articles: Vec<CanonicalArticle>,
    pub categorized_articles: BTreeMap<String, Vec<CanonicalArticle>>,
    pub total_articles: usize,
    pub account_info: Option<BTreeMap<String, AccountInfo>>,
    pub sync_info: Option<HomeSyncInfo>,
    pub stats: HomeStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSummary {
    pub name: String,
    pub articles: usize,
    pub errors: u64,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncInfo {
    #[serde(flatten)]
    pub stats: SyncStats,
    pub accounts: Vec<AccountSummary>,
    pub last_sync_file: String,
    pub snapshot_sha256: String,
}
