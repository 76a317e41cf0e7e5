//! Text normalization shared by extraction and prompt building.

use std::sync::LazyLock;

use regex::Regex;

static INLINE_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\S\n]+").expect("valid regex"));
static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid regex"));
static ANY_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// Collapses whitespace runs inside lines and blank-line runs to a single
/// paragraph break, keeping paragraph structure.
pub fn normalize_whitespace(text: &str) -> String {
    let collapsed = INLINE_SPACE.replace_all(text, " ");
    let lines: Vec<&str> = collapsed.lines().map(str::trim).collect();
    let joined = lines.join("\n");
    BLANK_LINES.replace_all(&joined, "\n\n").trim().to_string()
}

/// Collapses every whitespace run, newlines included, to a single space.
pub fn collapse_whitespace(text: &str) -> String {
    ANY_SPACE.replace_all(text, " ").trim().to_string()
}

/// Replaces markup tags with spaces and collapses the result to one line.
pub fn strip_markup(html: &str) -> String {
    collapse_whitespace(&TAG.replace_all(html, " "))
}

/// Truncates to at most `max` characters, never splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Character count, the unit every length threshold is measured in.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
