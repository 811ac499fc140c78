//! Turns a parsed [`Query`] into a native select request.

use std::sync::LazyLock;

use pkgsearch_core::query::Query;
use pkgsearch_solr::escape::escape_term;
use pkgsearch_solr::select::SelectQuery;
use regex::Regex;

/// Weighted fields searched by the free-text query.
pub const QUERY_FIELDS: [&str; 7] = [
    "name^4",
    "package_name^4",
    "description",
    "tags",
    "text",
    "text_ngram",
    "name_split^2",
];

/// Fields scored for phrase proximity.
pub const PHRASE_FIELDS: [&str; 1] = ["description"];

/// Relevance boost, logarithmic in trendiness.
pub const BOOST_FUNCTIONS: [&str; 1] = ["log(trendiness)^10"];

static LEADING_MINUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^| )\\-(\S)").expect("minus pattern is valid"));

static LEADING_PLUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^| )\\\+(\S)").expect("plus pattern is valid"));

/// Build the select request for `query`.
///
/// Filter clauses are only added for non-empty filters. The engine page is
/// 1-based, so the query's 0-based page is shifted by one.
#[must_use]
pub fn translate(query: &Query) -> SelectQuery {
    let mut select = SelectQuery {
        q: escape_query(&query.query),
        def_type: "edismax".to_owned(),
        query_fields: QUERY_FIELDS.map(str::to_owned).to_vec(),
        phrase_fields: PHRASE_FIELDS.map(str::to_owned).to_vec(),
        boost_functions: BOOST_FUNCTIONS.map(str::to_owned).to_vec(),
        minimum_match: "1".to_owned(),
        filter_queries: Vec::new(),
        sorts: query
            .order_bys
            .iter()
            .map(|o| format!("{} {}", o.field.as_str(), o.order.as_str()))
            .collect(),
        page: query.page.saturating_add(1),
        rows: query.per_page,
    };

    let types = query.types();
    if !types.is_empty() {
        select.add_filter_query("type", all_of("type", &types));
    }
    if !query.tags.is_empty() {
        select.add_filter_query("tags", all_of("tags", &query.tags));
    }

    select
}

/// Escape free text while keeping the user's `-`/`+` operators and balanced
/// quotes, then wrap the result in quotes.
///
/// ```
/// use pkgsearch_api::search::translate::escape_query;
///
/// assert_eq!(escape_query(r#"-foo +bar "baz""#), r#""-foo +bar "baz"""#);
/// assert_eq!(escape_query("a:b"), r#""a\:b""#);
/// ```
#[must_use]
pub fn escape_query(raw: &str) -> String {
    let escaped = escape_term(raw);
    let escaped = LEADING_MINUS.replace_all(&escaped, "${1}-${2}");
    let escaped = LEADING_PLUS.replace_all(&escaped, "${1}+${2}");
    let escaped = if escaped.matches('"').count() % 2 == 0 {
        escaped.replace("\\\"", "\"")
    } else {
        escaped.into_owned()
    };
    format!("\"{escaped}\"")
}

/// `field:("a" AND "b")` over the escaped values.
fn all_of<S: AsRef<str>>(field: &str, values: &[S]) -> String {
    let escaped: Vec<String> = values.iter().map(|v| escape_term(v.as_ref())).collect();
    format!("{field}:(\"{}\")", escaped.join("\" AND \""))
}
