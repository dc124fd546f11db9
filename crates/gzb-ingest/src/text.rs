use once_cell::sync::Lazy;
use regex::Regex;

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag pattern compiles"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern compiles"));

/// Drops every `<...>` run and collapses whitespace to single spaces.
pub fn strip_markup(content: &str) -> String {
    let without_tags = TAG.replace_all(content, "");
    WHITESPACE.replace_all(&without_tags, " ").trim().to_string()
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Returns the first `max_chars` characters and whether anything was cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (&text[..byte_idx], true),
        None => (text, false),
    }
}
