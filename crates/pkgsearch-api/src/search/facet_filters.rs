//! The batch form's `facetFilters` mini-language.
//!
//! The value is JSON: an outer array of groups, each group an array of
//! `"facet:value"` strings. Only `tags` and `type` are supported; groups are
//! flattened, so OR within a group is read as AND like everything else.

use log::debug;
use serde_json::Value;

/// Filters extracted from a `facetFilters` value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetFilters {
    /// Tags every hit must carry.
    pub tags: Vec<String>,
    /// Requested package types.
    pub types: Vec<String>,
}

impl FacetFilters {
    /// Comma-joined types, the form the type filter takes.
    #[must_use]
    pub fn type_filter(&self) -> String {
        self.types.join(",")
    }
}

/// Parse a raw `facetFilters` value.
///
/// Invalid JSON, non-array groups, non-string entries, entries without a `:`
/// and unsupported facet names are skipped.
#[must_use]
pub fn parse(raw: &str) -> FacetFilters {
    let mut filters = FacetFilters::default();
    let Ok(Value::Array(groups)) = serde_json::from_str::<Value>(raw) else {
        return filters;
    };

    for group in groups {
        let Value::Array(entries) = group else {
            continue;
        };
        for entry in entries {
            let Value::String(entry) = entry else {
                continue;
            };
            let Some((facet, value)) = entry.split_once(':') else {
                continue;
            };
            match facet {
                "tags" => filters.tags.push(value.to_owned()),
                "type" => filters.types.push(value.to_owned()),
                other => debug!("ignoring unsupported facet filter {other}"),
            }
        }
    }
    filters
}
