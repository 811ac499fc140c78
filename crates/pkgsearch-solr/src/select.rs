//! Select queries and the typed hits they return.

use serde::{Deserialize, Deserializer};

/// A named filter clause (`fq`) applied on top of the main query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterQuery {
    /// Key identifying the clause; a later clause with the same key replaces
    /// the earlier one.
    pub key: String,
    /// Clause in the engine's query syntax, e.g. `type:("library")`.
    pub query: String,
}

/// A fully configured select request.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    /// Main query string.
    pub q: String,
    /// Query parser, `edismax` for weighted multi-field matching.
    pub def_type: String,
    /// Weighted query fields (`qf`).
    pub query_fields: Vec<String>,
    /// Phrase fields (`pf`).
    pub phrase_fields: Vec<String>,
    /// Boost functions (`bf`).
    pub boost_functions: Vec<String>,
    /// Minimum should match (`mm`).
    pub minimum_match: String,
    /// Filter clauses, in insertion order.
    pub filter_queries: Vec<FilterQuery>,
    /// Sort clauses such as `downloads desc`.
    pub sorts: Vec<String>,
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub rows: u32,
}

impl SelectQuery {
    /// Add a filter clause, replacing any existing clause with the same key.
    pub fn add_filter_query(&mut self, key: impl Into<String>, query: impl Into<String>) {
        let key = key.into();
        let query = query.into();
        match self.filter_queries.iter_mut().find(|fq| fq.key == key) {
            Some(existing) => existing.query = query,
            None => self.filter_queries.push(FilterQuery { key, query }),
        }
    }

    /// Offset of the first row of the requested page.
    #[must_use]
    pub fn start(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.rows)
    }

    /// Request parameters in the order they are sent.
    #[must_use]
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", self.q.clone()),
            ("defType", self.def_type.clone()),
            ("qf", self.query_fields.join(" ")),
            ("pf", self.phrase_fields.join(" ")),
            ("bf", self.boost_functions.join(" ")),
            ("mm", self.minimum_match.clone()),
        ];
        params.extend(self.filter_queries.iter().map(|fq| ("fq", fq.query.clone())));
        if !self.sorts.is_empty() {
            params.push(("sort", self.sorts.join(",")));
        }
        params.push(("start", self.start().to_string()));
        params.push(("rows", self.rows.to_string()));
        params.push(("wt", "json".to_owned()));
        params
    }
}

/// One document returned by a select, with a fixed shape.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NativeHit {
    /// Document id as text: digits for packages, `virtual:<name>` otherwise.
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    /// Full name.
    pub name: String,
    /// Name without vendor prefix.
    pub package_name: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Package type.
    #[serde(rename = "type")]
    pub package_type: Option<String>,
    /// Repository URL.
    pub repository: Option<String>,
    /// Repository language.
    pub language: Option<String>,
    /// Tags.
    pub tags: Vec<String>,
    /// `1` when abandoned.
    pub abandoned: i64,
    /// Replacement package name.
    #[serde(rename = "replacementPackage")]
    pub replacement_package: Option<String>,
    /// Lifetime downloads.
    pub downloads: Option<u64>,
    /// Favorite count.
    pub favers: Option<u64>,
    /// Popularity signal.
    pub popularity: Option<i64>,
    /// Trendiness signal.
    pub trendiness: Option<f64>,
}

impl NativeHit {
    /// Whether the id is made only of decimal digits, i.e. a registered package.
    #[must_use]
    pub fn is_package(&self) -> bool {
        !self.id.is_empty() && self.id.bytes().all(|b| b.is_ascii_digit())
    }
}

fn id_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

/// One page of select results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectResult {
    /// Total number of matching documents across all pages.
    pub num_found: u64,
    /// Documents on the requested page.
    pub docs: Vec<NativeHit>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SelectResponse {
    pub(crate) response: ResponseBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseBody {
    #[serde(rename = "numFound")]
    pub(crate) num_found: u64,
    #[serde(default)]
    pub(crate) docs: Vec<NativeHit>,
}

impl From<SelectResponse> for SelectResult {
    fn from(raw: SelectResponse) -> Self {
        Self {
            num_found: raw.response.num_found,
            docs: raw.response.docs,
        }
    }
}
