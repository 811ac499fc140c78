//! Form-encoded parameter lists with bracketed array keys.
//!
//! Callers of the search contract send lists as `tags[]=a&tags[]=b` or
//! `tags[0]=a`, and sort clauses as `orderBys[0][sort]=downloads`. The same
//! encoding appears in query strings and inside the batch `params` blob.

use pkgsearch_core::query::OrderBy;
use url::form_urlencoded;

/// Decoded key/value pairs in their original order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    /// Decode an `application/x-www-form-urlencoded` string.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self {
            pairs: form_urlencoded::parse(raw.as_bytes()).into_owned().collect(),
        }
    }

    /// Last value given for exactly `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether `key` was given at all, with or without a value.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// Every value for `key`, `key[]` or `key[<index>]`, in order.
    #[must_use]
    pub fn get_list(&self, key: &str) -> Vec<String> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key || list_index(k, key).is_some())
            .map(|(_, v)| v.clone())
            .collect()
    }

    /// Valid `orderBys[<i>][sort]` / `orderBys[<i>][order]` pairs, grouped by
    /// index in first-seen order. Incomplete or unknown entries are dropped.
    #[must_use]
    pub fn order_bys(&self) -> Vec<OrderBy> {
        let mut entries: Vec<(&str, Option<&str>, Option<&str>)> = Vec::new();
        for (key, value) in &self.pairs {
            let Some((index, field)) = order_by_key(key) else {
                continue;
            };
            let position = match entries.iter().position(|(i, _, _)| *i == index) {
                Some(position) => position,
                None => {
                    entries.push((index, None, None));
                    entries.len() - 1
                }
            };
            let entry = &mut entries[position];
            match field {
                "sort" => entry.1 = Some(value),
                "order" => entry.2 = Some(value),
                _ => {}
            }
        }

        entries
            .into_iter()
            .filter_map(|(_, sort, order)| OrderBy::parse(sort?, order?))
            .collect()
    }
}

/// The bracketed part of `key[...]`, if `candidate` is a list entry of `key`.
fn list_index<'a>(candidate: &'a str, key: &str) -> Option<&'a str> {
    let inner = candidate.strip_prefix(key)?.strip_prefix('[')?.strip_suffix(']')?;
    (!inner.contains(['[', ']'])).then_some(inner)
}

fn order_by_key(key: &str) -> Option<(&str, &str)> {
    let rest = key.strip_prefix("orderBys[")?;
    let (index, rest) = rest.split_once(']')?;
    let field = rest.strip_prefix('[')?.strip_suffix(']')?;
    Some((index, field))
}

#[cfg(test)]
mod tests {
    use pkgsearch_core::query::{SortField, SortOrder};

    use super::*;

    #[test]
    fn last_scalar_value_wins() {
        let params = Params::parse("q=first&q=second&type=library");
        assert_eq!(params.get("q"), Some("second"));
        assert_eq!(params.get("type"), Some("library"));
        assert_eq!(params.get("page"), None);
    }

    #[test]
    fn lists_accept_every_bracket_form() {
        let params = Params::parse("tags%5B%5D=cli&tags[]=http%20client&tags[3]=psr&tagsx=no&tags[a][b]=no");
        assert_eq!(params.get_list("tags"), ["cli", "http client", "psr"]);
    }

    #[test]
    fn plain_key_counts_as_one_element_list() {
        assert_eq!(Params::parse("tags=orm").get_list("tags"), ["orm"]);
    }

    #[test]
    fn present_without_value_is_contained() {
        let params = Params::parse("q=&page=2");
        assert!(params.contains("q"));
        assert_eq!(params.get("q"), Some(""));
        assert!(!params.contains("type"));
    }

    #[test]
    fn order_bys_are_grouped_by_index() {
        let params = Params::parse(
            "orderBys[1][sort]=favers&orderBys[0][sort]=downloads&orderBys[0][order]=desc\
             &orderBys[1][order]=asc&orderBys[2][sort]=name&orderBys[2][order]=asc\
             &orderBys[3][sort]=downloads",
        );
        assert_eq!(
            params.order_bys(),
            [
                OrderBy { field: SortField::Favers, order: SortOrder::Asc },
                OrderBy { field: SortField::Downloads, order: SortOrder::Desc },
            ]
        );
    }
}
