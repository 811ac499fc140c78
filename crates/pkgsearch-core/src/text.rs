//! Free-text cleanup shared by documents and tags.

/// Remove ASCII control characters (`U+0000`..=`U+001F`).
///
/// Tabs and newlines are control characters too, so they are removed rather
/// than turned into spaces.
#[must_use]
pub fn strip_control_chars(input: &str) -> String {
    input.chars().filter(|c| !matches!(c, '\u{0}'..='\u{1f}')).collect()
}

/// Return the part of a `vendor/project` name after the first `/`.
///
/// Names without a vendor prefix are returned unchanged.
#[must_use]
pub fn strip_vendor(name: &str) -> &str {
    name.split_once('/').map_or(name, |(_, project)| project)
}
