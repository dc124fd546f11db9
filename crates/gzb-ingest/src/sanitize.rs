//! Cleanup of third-party article HTML before it is embedded in a site page.
//!
//! Rules run in a fixed order; several depend on earlier ones having already
//! removed document wrappers or placeholder text.

use once_cell::sync::Lazy;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::{Captures, Regex};

use crate::quality::IMAGE_CDN_HOST;

pub const DEFAULT_IMAGE_PROXY_PATH: &str = "/api/proxy-image";

/// Same escapes as JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizeOptions {
    /// Route that relays CDN images; `?url=<encoded original>` is appended.
    pub image_proxy_path: String,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            image_proxy_path: DEFAULT_IMAGE_PROXY_PATH.to_string(),
        }
    }
}

struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

fn rules(specs: &[(&str, &'static str)]) -> Vec<Rule> {
    specs
        .iter()
        .map(|(pattern, replacement)| Rule {
            pattern: Regex::new(pattern).expect("sanitizer pattern compiles"),
            replacement,
        })
        .collect()
}

fn apply(rules: &[Rule], mut html: String) -> String {
    for rule in rules {
        if rule.pattern.is_match(&html) {
            html = rule.pattern.replace_all(&html, rule.replacement).into_owned();
        }
    }
    html
}

static DOCUMENT_WRAPPERS: Lazy<Vec<Rule>> = Lazy::new(|| {
    rules(&[
        (r"(?i)<!DOCTYPE[^>]*>", ""),
        (r"(?i)<html[^>]*>", ""),
        (r"(?i)</html>", ""),
        (r"(?i)<head[^>]*>[\s\S]*?</head>", ""),
        (r"(?i)<body[^>]*>", ""),
        (r"(?i)</body>", ""),
        (r"(?i)<style[^>]*>[\s\S]*?</style>", ""),
    ])
});

static CDN_IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<img([^>]*src="(https://mmbiz\.qpic\.cn[^"]*)"[^>]*)>"#)
        .expect("image pattern compiles")
});

static PLACEHOLDERS: Lazy<Vec<Rule>> = Lazy::new(|| {
    rules(&[
        (r#"(?i)<div[^>]*class="[^"]*mb-8[^"]*"[^>]*>[\s\S]*?</div>"#, ""),
        (r"(?i)<div[^>]*mb-8[^>]*>[\s\S]*?</div>", ""),
        ("此图片来自微信公众号", ""),
        ("图片来自微信公众号", ""),
        ("来自微信公众号", ""),
        ("微信公众号", ""),
    ])
});

static EMPTY_BLOCKS: Lazy<Vec<Rule>> = Lazy::new(|| {
    rules(&[
        (r"(?i)<p><br\s*/?></p>", ""),
        (r"(?i)<p>\s*</p>", ""),
        (r"(?i)(<br\s*/?>){3,}", "<br><br>"),
        (r"(?i)<mp-style-type[^>]*>[\s\S]*?</mp-style-type>", ""),
    ])
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern compiles"));

static EMPTY_MB8: Lazy<Vec<Rule>> =
    Lazy::new(|| rules(&[(r#"(?i)<div[^>]*class="[^"]*mb-8[^"]*"[^>]*>\s*</div>"#, "")]));

fn proxy_images(html: &str, options: &SanitizeOptions) -> String {
    if !html.contains(IMAGE_CDN_HOST) {
        return html.to_string();
    }
    CDN_IMAGE
        .replace_all(html, |caps: &Captures<'_>| {
            let attrs = caps[1].trim_end_matches(|c: char| c == '/' || c.is_whitespace());
            let original = &caps[2];
            let encoded = utf8_percent_encode(original, URI_COMPONENT);
            let proxied = format!("{}?url={encoded}", options.image_proxy_path);
            let attrs = attrs.replacen(
                &format!("src=\"{original}\""),
                &format!("src=\"{proxied}\""),
                1,
            );
            format!("<img{attrs} loading=\"lazy\" data-original-src=\"{original}\">")
        })
        .into_owned()
}

pub fn sanitize_article_html(content: &str, options: &SanitizeOptions) -> String {
    if content.is_empty() {
        return String::new();
    }
    let html = apply(&DOCUMENT_WRAPPERS, content.to_string());
    let html = proxy_images(&html, options);
    let html = apply(&PLACEHOLDERS, html);
    let html = apply(&EMPTY_BLOCKS, html);
    let html = WHITESPACE.replace_all(&html, " ").trim().to_string();
    apply(&EMPTY_MB8, html)
}
