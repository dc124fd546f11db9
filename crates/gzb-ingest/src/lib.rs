//! Raw-record vetting and normalization into site articles.

pub mod category;
pub mod normalize;
pub mod quality;
pub mod sanitize;
pub mod text;

pub use category::{map_category, CategoryMapping};
pub use normalize::{
    normalize, sanitize_account_name, synthesize_id, title_fragment, url_segment, IdContext,
    IdRule, NormalizedArticle,
};
pub use quality::{check_publishable, is_publishable, QualityThresholds, Rejection, IMAGE_CDN_HOST};
pub use sanitize::{sanitize_article_html, SanitizeOptions};
pub use text::strip_markup;

pub const CRATE_NAME: &str = "gzb-ingest";
