// src/text.rs
//! Small text helpers shared by ingestion, extraction and the collectors.

use once_cell::sync::OnceCell;
use regex::Regex;

fn ws_regex() -> &'static Regex {
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    RE_WS.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"))
}

/// Trim and collapse runs of whitespace into a single space.
pub fn collapse_whitespace(s: &str) -> String {
    ws_regex().replace_all(s.trim(), " ").to_string()
}

/// Normalize article text: decode entities, strip tags, straighten quotes,
/// collapse whitespace, cap length.
pub fn normalize_article_text(s: &str, max_chars: usize) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
    out = re_tags.replace_all(&out, "").to_string();

    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    out = collapse_whitespace(&out);

    if out.chars().count() > max_chars {
        out = out.chars().take(max_chars).collect();
    }
    out
}

/// Strip markdown code fences models like to wrap JSON in.
pub fn strip_code_fences(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Round half up (towards +inf).
pub fn round_half_up(x: f64) -> i64 {
    (x + 0.5).floor() as i64
}
