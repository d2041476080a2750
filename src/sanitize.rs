//! Input normalisation for values submitted by the admin client.

use std::sync::OnceLock;

use regex::Regex;

fn tag_pattern() -> &'static Regex {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    TAGS.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("static regex"))
}

fn whitespace_pattern() -> &'static Regex {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// Lowercases and keeps only ASCII alphanumerics, `_` and `-`.
pub fn sanitize_key(input: &str) -> String {
    input
        .chars()
        .filter_map(|c| {
            let c = c.to_ascii_lowercase();
            (c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-').then_some(c)
        })
        .collect()
}

/// Strips markup, collapses runs of whitespace and trims.
pub fn sanitize_text(input: &str) -> String {
    let stripped = tag_pattern().replace_all(input, "");
    whitespace_pattern()
        .replace_all(&stripped, " ")
        .trim()
        .to_string()
}
