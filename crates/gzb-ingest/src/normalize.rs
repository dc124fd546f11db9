use chrono::{DateTime, SecondsFormat, Utc};
use gzb_core::{CanonicalArticle, RawArticleRecord};

use crate::category::{map_category, CategoryMapping};
use crate::text::{strip_markup, truncate_chars};

/// Minimum length for an upstream or URL-derived identifier to be trusted.
pub const MIN_ID_CHARS: usize = 5;
pub const TITLE_FRAGMENT_CHARS: usize = 20;
pub const SUMMARY_CHARS: usize = 200;
pub const UNTITLED: &str = "无标题";

const URL_ID_MARKER: &str = "/s/";

/// Inputs the ID rules look at.
#[derive(Debug, Clone, Copy)]
pub struct IdContext<'a> {
    pub upstream_id: Option<&'a str>,
    pub source_url: Option<&'a str>,
    pub account_slug: &'a str,
    pub index_within_account: usize,
    pub title: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdRule {
    UpstreamId,
    UrlSegment,
    AccountIndexTitle,
}

impl IdRule {
    pub const PRIORITY: [IdRule; 3] = [IdRule::UpstreamId, IdRule::UrlSegment, IdRule::AccountIndexTitle];

    pub fn apply(self, ctx: &IdContext<'_>) -> Option<String> {
        match self {
            Self::UpstreamId => ctx
                .upstream_id
                .filter(|id| id.chars().count() >= MIN_ID_CHARS)
                .map(|id| format!("{id}_{}", ctx.account_slug)),
            Self::UrlSegment => ctx
                .source_url
                .and_then(url_segment)
                .filter(|seg| seg.chars().count() >= MIN_ID_CHARS)
                .map(|seg| format!("{seg}_{}", ctx.account_slug)),
            Self::AccountIndexTitle => Some(account_index_title_id(ctx)),
        }
    }
}

fn account_index_title_id(ctx: &IdContext<'_>) -> String {
    format!(
        "{}_{}_{}",
        ctx.account_slug,
        ctx.index_within_account,
        title_fragment(ctx.title)
    )
}

/// Walks [`IdRule::PRIORITY`] and returns the first rule that yields an ID.
pub fn synthesize_id(ctx: &IdContext<'_>) -> (String, IdRule) {
    IdRule::PRIORITY
        .into_iter()
        .find_map(|rule| rule.apply(ctx).map(|id| (id, rule)))
        .unwrap_or_else(|| (account_index_title_id(ctx), IdRule::AccountIndexTitle))
}

/// ASCII letters and digits only; CJK account names sanitize to `""`.
pub fn sanitize_account_name(name: &str) -> String {
    name.chars().filter(char::is_ascii_alphanumeric).collect()
}

fn is_cjk_unified(c: char) -> bool {
    ('\u{4e00}'..='\u{9fa5}').contains(&c)
}

pub fn title_fragment(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || is_cjk_unified(*c))
        .take(TITLE_FRAGMENT_CHARS)
        .collect()
}

/// Path segment after the first `/s/`, up to the next `/s/` or query string.
pub fn url_segment(url: &str) -> Option<&str> {
    let rest = url.split(URL_ID_MARKER).nth(1)?;
    rest.split('?').next()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedArticle {
    pub article: CanonicalArticle,
    pub category: CategoryMapping,
    pub id_rule: IdRule,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

pub fn normalize(
    raw: &RawArticleRecord,
    account_name: &str,
    index_within_account: usize,
    processed_at: DateTime<Utc>,
) -> NormalizedArticle {
    let account_slug = sanitize_account_name(account_name);
    let raw_title = raw.title.as_deref().unwrap_or_default();
    let (id, id_rule) = synthesize_id(&IdContext {
        upstream_id: raw.wechat_article_id.as_deref(),
        source_url: raw.original_url.as_deref(),
        account_slug: &account_slug,
        index_within_account,
        title: raw_title,
    });

    let content = raw.preferred_content().to_string();
    let summary = match non_empty(raw.excerpt.as_deref()) {
        Some(excerpt) => excerpt.to_string(),
        None => {
            let text = strip_markup(&content);
            let (head, truncated) = truncate_chars(&text, SUMMARY_CHARS);
            if truncated {
                format!("{head}...")
            } else {
                head.to_string()
            }
        }
    };

    let category = map_category(raw.category_id.as_deref().unwrap_or_default());
    let stamp = processed_at.to_rfc3339_opts(SecondsFormat::Millis, true);

    let article = CanonicalArticle {
        id,
        title: non_empty(raw.title.as_deref()).unwrap_or(UNTITLED).to_string(),
        content,
        summary,
        category_id: category.as_str().to_string(),
        cover_image: raw.cover_image_url.clone().unwrap_or_default(),
        publish_time: non_empty(raw.post_time_str.as_deref())
            .map(ToString::to_string)
            .unwrap_or_else(|| processed_at.format("%Y-%m-%d").to_string()),
        original_link: raw.original_url.clone(),
        read_count: raw.send_to_fans_num.unwrap_or(0),
        is_featured: false,
        created_at: non_empty(raw.published_at.as_deref())
            .map(ToString::to_string)
            .unwrap_or_else(|| stamp.clone()),
        updated_at: stamp,
    };

    NormalizedArticle {
        article,
        category,
        id_rule,
    }
}
