//! Escaping of the engine's query syntax.

use std::sync::LazyLock;

use regex::Regex;

static SPECIAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\+|-|&&|\|\||!|\(|\)|\{|\}|\[|\]|\^|"|~|\*|\?|:|/|\\)"#)
        .expect("escape pattern is valid")
});

/// Backslash-escape every query syntax character in `term`.
///
/// `&&` and `||` are escaped as pairs; a lone `&` or `|` is left alone.
#[must_use]
pub fn escape_term(term: &str) -> String {
    SPECIAL.replace_all(term, r"\${1}").into_owned()
}
