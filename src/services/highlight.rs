//! Case-insensitive match ranges for the textbook reader.
//!
//! Offsets are in characters, not bytes, so a client can slice the page text
//! it already holds without re-encoding.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct Highlight {
    pub(crate) start: usize,
    pub(crate) end: usize,
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Non-overlapping, left-to-right matches of `query` in `text`. A blank query
/// matches nothing.
pub(crate) fn find_matches(text: &str, query: &str) -> Vec<Highlight> {
    let needle: Vec<char> = query.trim().chars().map(fold).collect();
    if needle.is_empty() {
        return Vec::new();
    }

    let haystack: Vec<char> = text.chars().map(fold).collect();
    let mut matches = Vec::new();
    let mut position = 0;

    while position + needle.len() <= haystack.len() {
        if haystack[position..position + needle.len()] == needle[..] {
            matches.push(Highlight { start: position, end: position + needle.len() });
            position += needle.len();
        } else {
            position += 1;
        }
    }

    matches
}

/// The matched text with up to `radius` characters of context on each side,
/// trimmed to whole words where possible and marked with ellipses when cut.
pub(crate) fn snippet(text: &str, highlight: Highlight, radius: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    let end = highlight.end.min(chars.len());
    let start = highlight.start.min(end);

    let mut from = start.saturating_sub(radius);
    let mut to = (end + radius).min(chars.len());

    if from > 0 {
        if let Some(space) = chars[from..start].iter().position(|c| c.is_whitespace()) {
            from += space + 1;
        }
    }
    if to < chars.len() {
        if let Some(space) = chars[end..to].iter().rposition(|c| c.is_whitespace()) {
            to = end + space;
        }
    }

    let body: String = chars[from..to].iter().collect();
    let body = body.trim();
    let prefix = if from > 0 { "..." } else { "" };
    let suffix = if to < chars.len() { "..." } else { "" };

    format!("{prefix}{body}{suffix}")
}
