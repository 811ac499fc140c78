//! Tag normalisation for faceting.

use std::collections::HashSet;

use crate::text::strip_control_chars;

/// Normalise raw tags into a deduplicated, facet-safe list.
///
/// Each tag has its control characters removed, is lower-cased, has every
/// run of whitespace or hyphens collapsed to one space and is trimmed.
/// Duplicates are detected on the normalised form; the first occurrence
/// keeps its position. Tags that end up empty are dropped.
#[must_use]
pub fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut normalized = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = normalize_tag(tag.as_ref());
        if tag.is_empty() || !seen.insert(tag.clone()) {
            continue;
        }
        normalized.push(tag);
    }
    normalized
}

fn normalize_tag(raw: &str) -> String {
    let lowered = strip_control_chars(raw).to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut in_separator = false;
    for c in lowered.chars() {
        if c.is_whitespace() || c == '-' {
            in_separator = true;
            continue;
        }
        if in_separator && !out.is_empty() {
            out.push(' ');
        }
        in_separator = false;
        out.push(c);
    }
    out
}
