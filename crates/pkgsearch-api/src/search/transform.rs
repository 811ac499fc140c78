//! Reshapes native hits into the hosted-search result contract.
//!
//! Facet counts are tallied from the hits of the returned page only, not the
//! whole result set, so `exhaustiveFacetsCount` is a nominal flag. Highlight
//! entries are stubs that echo the raw field value.

use std::collections::HashMap;

use pkgsearch_core::query::{Query, DEFAULT_PER_PAGE};
use pkgsearch_solr::select::NativeHit;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use url::form_urlencoded;

/// Language reported for hits whose document has none.
const DEFAULT_LANGUAGE: &str = "php";

/// One page of native hits plus the paging figures around it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PagedResult {
    /// Hits on this page.
    pub hits: Vec<NativeHit>,
    /// Total matches across all pages.
    pub nb_hits: u64,
    /// 1-based page number.
    pub current_page: u32,
    /// Page size, at least 1.
    pub per_page: u32,
}

impl PagedResult {
    /// Number of pages; an empty result still has one.
    #[must_use]
    pub fn nb_pages(&self) -> u64 {
        self.nb_hits.div_ceil(u64::from(self.per_page.max(1))).max(1)
    }

    /// Whether a page follows the current one.
    #[must_use]
    pub fn has_next(&self) -> bool {
        u64::from(self.current_page) < self.nb_pages()
    }
}

/// Value counts in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetCounts {
    counts: Vec<(String, u64)>,
    positions: HashMap<String, usize>,
}

impl FacetCounts {
    fn add(&mut self, value: &str) {
        if let Some(&position) = self.positions.get(value) {
            self.counts[position].1 += 1;
        } else {
            self.positions.insert(value.to_owned(), self.counts.len());
            self.counts.push((value.to_owned(), 1));
        }
    }

    /// Count for `value`, if it occurred.
    #[must_use]
    pub fn get(&self, value: &str) -> Option<u64> {
        self.positions.get(value).map(|&position| self.counts[position].1)
    }

    /// Number of distinct values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether nothing was counted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl Serialize for FacetCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counts.len()))?;
        for (value, count) in &self.counts {
            map.serialize_entry(value, count)?;
        }
        map.end()
    }
}

/// Page-local facet tallies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Facets {
    /// Occurrences of each tag across the page's hits.
    pub tags: FacetCounts,
    /// Occurrences of each package type across the page's hits.
    #[serde(rename = "type")]
    pub types: FacetCounts,
}

/// Hit id: a number for registered packages, text for virtual ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum HitId {
    /// Registered package id.
    Number(i64),
    /// `virtual:<name>`.
    Text(String),
}

/// Abandonment state; serialized as `0`, `true` or the replacement name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Abandoned {
    /// Still maintained.
    No,
    /// Abandoned without a replacement.
    Yes,
    /// Abandoned in favour of the named package.
    ReplacedBy(String),
}

impl Serialize for Abandoned {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::No => serializer.serialize_u8(0),
            Self::Yes => serializer.serialize_bool(true),
            Self::ReplacedBy(name) => serializer.serialize_str(name),
        }
    }
}

/// Raw and display-formatted counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HitMeta {
    /// Lifetime downloads.
    pub downloads: u64,
    /// `downloads` with space-separated thousands.
    pub downloads_formatted: String,
    /// Favorite count.
    pub favers: u64,
    /// `favers` with space-separated thousands.
    pub favers_formatted: String,
}

/// Highlight stub for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightField {
    /// Always `false`.
    pub fully_highlighted: bool,
    /// The unmodified field value.
    pub value: String,
    /// Always `"full"`.
    pub match_level: &'static str,
}

impl HighlightField {
    fn stub(value: &str) -> Self {
        Self {
            fully_highlighted: false,
            value: value.to_owned(),
            match_level: "full",
        }
    }
}

/// Highlight stubs for the fields the contract highlights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighlightResult {
    /// Description stub.
    pub description: HighlightField,
    /// Name stub.
    pub name: HighlightField,
}

/// Fields only registered packages carry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageDetail {
    /// Lifetime downloads.
    pub downloads: u64,
    /// Favorite count.
    pub favers: u64,
    /// Trendiness signal.
    pub trendiness: Option<f64>,
    /// Counts for presentation layers.
    pub meta: HitMeta,
    /// Highlight stubs.
    #[serde(rename = "_highlightResult")]
    pub highlight_result: HighlightResult,
}

/// Marker carried by virtual packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VirtualDetail {
    /// Always `true`.
    #[serde(rename = "virtual")]
    pub is_virtual: bool,
}

/// Fields that differ between registered and virtual packages.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HitKind {
    /// A registered package.
    Package(PackageDetail),
    /// A name provided by other packages.
    Virtual(VirtualDetail),
}

/// One hit in the contract shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit {
    /// Numeric or `virtual:` id.
    pub id: HitId,
    /// Full name.
    pub name: String,
    /// Description, empty when missing.
    pub description: String,
    /// Absolute package or provider page URL.
    pub url: String,
    /// Repository URL.
    pub repository: Option<String>,
    /// Object id, the package name.
    #[serde(rename = "objectID")]
    pub object_id: String,
    /// Name without vendor, falling back to the full name.
    pub package_name: String,
    /// Package type.
    #[serde(rename = "type")]
    pub package_type: Option<String>,
    /// Tags.
    pub tags: Vec<String>,
    /// Repository language, `php` when unknown.
    pub language: String,
    /// Abandonment state.
    pub abandoned: Abandoned,
    /// Popularity signal.
    pub popularity: Option<i64>,
    /// Replacement package as stored.
    #[serde(rename = "replacementPackage")]
    pub replacement_package: Option<String>,
    /// Package-only or virtual-only fields.
    #[serde(flatten)]
    pub kind: HitKind,
}

/// A complete result in the hosted-search shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Hits on this page.
    pub hits: Vec<Hit>,
    /// Page-local facet counts.
    pub facets: Facets,
    /// 0-based page.
    pub page: u32,
    /// Echoed index name, empty for the single-query form.
    pub index: String,
    /// Free-text query as received.
    pub query: String,
    /// Echoed raw params, empty for the single-query form.
    pub params: String,
    /// Page size.
    pub hits_per_page: u32,
    /// Always `true`.
    pub exhaustive_facets_count: bool,
    /// Always `true`.
    pub exhaustive_nb_hits: bool,
    /// Time spent answering, in milliseconds.
    #[serde(rename = "processingTimeMS")]
    pub processing_time_ms: u64,
    /// Number of pages.
    pub nb_pages: u64,
    /// Total matches.
    pub nb_hits: u64,
    /// Absolute URL of the next page, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

/// Builds [`SearchResult`]s with absolute URLs under one public base.
#[derive(Debug, Clone)]
pub struct ResultTransformer {
    base_url: String,
}

impl ResultTransformer {
    /// `base_url` is the public origin, e.g. `https://packages.example.org`.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Reshape one page of native hits for `query`.
    ///
    /// `index`, `params` and `processingTimeMS` are left blank for the caller.
    #[must_use]
    pub fn transform(&self, query: &Query, page: &PagedResult) -> SearchResult {
        SearchResult {
            hits: page.hits.iter().map(|hit| self.hit(hit)).collect(),
            facets: facets(&page.hits),
            page: query.page,
            index: String::new(),
            query: query.query.clone(),
            params: String::new(),
            hits_per_page: page.per_page,
            exhaustive_facets_count: true,
            exhaustive_nb_hits: true,
            processing_time_ms: 0,
            nb_pages: page.nb_pages(),
            nb_hits: page.nb_hits,
            next: page.has_next().then(|| self.next_url(query, page)),
        }
    }

    fn hit(&self, hit: &NativeHit) -> Hit {
        let description = hit.description.clone().unwrap_or_default();
        let (id, url, kind) = if hit.is_package() {
            let downloads = hit.downloads.unwrap_or(0);
            let favers = hit.favers.unwrap_or(0);
            let detail = PackageDetail {
                downloads,
                favers,
                trendiness: hit.trendiness,
                meta: HitMeta {
                    downloads,
                    downloads_formatted: format_count(downloads),
                    favers,
                    favers_formatted: format_count(favers),
                },
                highlight_result: HighlightResult {
                    description: HighlightField::stub(&description),
                    name: HighlightField::stub(&hit.name),
                },
            };
            let id = hit
                .id
                .parse()
                .map_or_else(|_| HitId::Text(hit.id.clone()), HitId::Number);
            (id, format!("{}/packages/{}", self.base_url, hit.name), HitKind::Package(detail))
        } else {
            (
                HitId::Text(hit.id.clone()),
                format!("{}/providers/{}", self.base_url, hit.name),
                HitKind::Virtual(VirtualDetail { is_virtual: true }),
            )
        };

        let abandoned = match (hit.abandoned, hit.replacement_package.as_deref()) {
            (0, _) => Abandoned::No,
            (_, Some(replacement)) if !replacement.is_empty() => {
                Abandoned::ReplacedBy(replacement.to_owned())
            }
            _ => Abandoned::Yes,
        };

        Hit {
            id,
            name: hit.name.clone(),
            description,
            url,
            repository: hit.repository.clone(),
            object_id: hit.name.clone(),
            package_name: hit.package_name.clone().unwrap_or_else(|| hit.name.clone()),
            package_type: hit.package_type.clone(),
            tags: hit.tags.clone(),
            language: hit
                .language
                .clone()
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_owned()),
            abandoned,
            popularity: hit.popularity,
            replacement_package: hit.replacement_package.clone(),
            kind,
        }
    }

    fn next_url(&self, query: &Query, page: &PagedResult) -> String {
        let mut params = form_urlencoded::Serializer::new(String::new());
        params.append_pair("q", &query.query);
        params.append_pair("page", &(page.current_page + 1).to_string());
        for tag in &query.tags {
            params.append_pair("tags[]", tag);
        }
        if !query.type_filter.is_empty() {
            params.append_pair("type", &query.type_filter);
        }
        if query.per_page != DEFAULT_PER_PAGE {
            params.append_pair("per_page", &query.per_page.to_string());
        }
        format!("{}/search.json?{}", self.base_url, params.finish())
    }
}

fn facets(hits: &[NativeHit]) -> Facets {
    let mut facets = Facets::default();
    for hit in hits {
        for tag in &hit.tags {
            facets.tags.add(tag);
        }
        if let Some(package_type) = &hit.package_type {
            facets.types.add(package_type);
        }
    }
    facets
}

/// Group digits in threes with a space: `1234567` becomes `1 234 567`.
#[must_use]
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}
