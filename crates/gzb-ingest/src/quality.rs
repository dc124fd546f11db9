use gzb_core::RawArticleRecord;
use serde::Serialize;
use thiserror::Error;

use crate::text::{char_len, strip_markup};

/// Image CDN host whose presence marks a post as image-bearing.
pub const IMAGE_CDN_HOST: &str = "mmbiz.qpic.cn";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityThresholds {
    pub min_title_chars: usize,
    pub min_text_chars: usize,
    /// Image-bearing posts need strictly more stripped text than this.
    pub image_post_text_chars: usize,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            min_title_chars: 5,
            min_text_chars: 200,
            image_post_text_chars: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    #[error("upstream fetch reported failure")]
    FetchFailed,
    #[error("upstream fetch recorded an error")]
    FetchError,
    #[error("title missing or too short")]
    TitleTooShort,
    #[error("no html or plain content")]
    EmptyContent,
    #[error("extracted text below minimum length")]
    TextTooShort,
    #[error("image-only post")]
    ImageOnly,
}

pub fn check_publishable(
    raw: &RawArticleRecord,
    thresholds: &QualityThresholds,
) -> Result<(), Rejection> {
    if raw.fetch_success == Some(false) {
        return Err(Rejection::FetchFailed);
    }
    if raw.fetch_error.as_deref().is_some_and(|e| !e.is_empty()) {
        return Err(Rejection::FetchError);
    }
    let title_chars = raw.title.as_deref().map(char_len).unwrap_or(0);
    if title_chars < thresholds.min_title_chars {
        return Err(Rejection::TitleTooShort);
    }

    let content = raw.preferred_content();
    if content.is_empty() {
        return Err(Rejection::EmptyContent);
    }

    let text_chars = char_len(&strip_markup(content));
    if text_chars < thresholds.min_text_chars {
        return Err(Rejection::TextTooShort);
    }

    let has_images = content.contains("<img") || content.contains(IMAGE_CDN_HOST);
    if has_images && text_chars <= thresholds.image_post_text_chars {
        return Err(Rejection::ImageOnly);
    }
    Ok(())
}

pub fn is_publishable(raw: &RawArticleRecord) -> bool {
    check_publishable(raw, &QualityThresholds::default()).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(chars: usize) -> String {
        "字".repeat(chars)
    }

    fn good_record() -> RawArticleRecord {
        RawArticleRecord {
            title: Some("A perfectly fine title".into()),
            content_html: Some(format!("<p>{}</p>", body(250))),
            fetch_success: Some(true),
            ..Default::default()
        }
    }

    #[test]
    fn accepts_well_formed_record() {
        assert!(is_publishable(&good_record()));
    }

    #[test]
    fn fetch_failure_is_never_published() {
        let record = RawArticleRecord {
            fetch_success: Some(false),
            ..good_record()
        };
        assert_eq!(
            check_publishable(&record, &QualityThresholds::default()),
            Err(Rejection::FetchFailed)
        );
    }

    #[test]
    fn absent_fetch_flag_is_treated_as_success() {
        let record = RawArticleRecord {
            fetch_success: None,
            ..good_record()
        };
        assert!(is_publishable(&record));
    }

    #[test]
    fn fetch_error_message_rejects() {
        let record = RawArticleRecord {
            fetch_error: Some("timeout".into()),
            ..good_record()
        };
        assert!(!is_publishable(&record));

        let empty_error = RawArticleRecord {
            fetch_error: Some(String::new()),
            ..good_record()
        };
        assert!(is_publishable(&empty_error));
    }

    #[test]
    fn short_or_missing_title_rejects() {
        let short = RawArticleRecord {
            title: Some("四个字啊".into()),
            ..good_record()
        };
        assert_eq!(
            check_publishable(&short, &QualityThresholds::default()),
            Err(Rejection::TitleTooShort)
        );
        let missing = RawArticleRecord {
            title: None,
            ..good_record()
        };
        assert!(!is_publishable(&missing));
    }

    #[test]
    fn empty_content_rejects() {
        let record = RawArticleRecord {
            content_html: None,
            content: Some(String::new()),
            ..good_record()
        };
        assert_eq!(
            check_publishable(&record, &QualityThresholds::default()),
            Err(Rejection::EmptyContent)
        );
    }

    #[test]
    fn text_below_threshold_rejects_even_with_long_markup() {
        let record = RawArticleRecord {
            content_html: Some(format!(
                "<div style=\"{}\">{}</div>",
                "x".repeat(500),
                body(199)
            )),
            ..good_record()
        };
        assert_eq!(
            check_publishable(&record, &QualityThresholds::default()),
            Err(Rejection::TextTooShort)
        );
    }

    #[test]
    fn plain_content_is_used_when_html_missing() {
        let record = RawArticleRecord {
            content_html: None,
            content: Some(body(200)),
            ..good_record()
        };
        assert!(is_publishable(&record));
    }

    #[test]
    fn image_only_rejection_applies_under_relaxed_thresholds() {
        let thresholds = QualityThresholds {
            min_text_chars: 10,
            ..QualityThresholds::default()
        };
        let record = RawArticleRecord {
            content_html: Some(format!(
                "<img src=\"https://mmbiz.qpic.cn/a.jpg\"><p>{}</p>",
                body(50)
            )),
            ..good_record()
        };
        assert_eq!(check_publishable(&record, &thresholds), Err(Rejection::ImageOnly));

        let texty = RawArticleRecord {
            content_html: Some(format!("<img src=\"x.jpg\"><p>{}</p>", body(101))),
            ..good_record()
        };
        assert_eq!(check_publishable(&texty, &thresholds), Ok(()));
    }
}
