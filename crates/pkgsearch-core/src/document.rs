//! Search document construction.

use serde::Serialize;
use thiserror::Error;

use crate::signals::{popularity, trendiness, RankingInputs};
use crate::tags::normalize_tags;
use crate::text::{strip_control_chars, strip_vendor};
use crate::types::{DocumentId, Package};

/// `type` value of every virtual package document.
pub const VIRTUAL_PACKAGE_TYPE: &str = "virtual-package";

/// Fixed trendiness given to virtual packages, which have no usage data of
/// their own and would otherwise never surface.
pub const VIRTUAL_TRENDINESS: f64 = 100.0;

/// Composer's implicit type for packages that do not declare one.
pub const DEFAULT_PACKAGE_TYPE: &str = "library";

/// Errors raised while turning a record into a document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    /// The package record has no usable name.
    #[error("package {0} has an empty name")]
    EmptyName(i64),
    /// A `provide` entry cannot be used as a document name.
    #[error("invalid provided package name {0:?}")]
    InvalidProvidedName(String),
}

/// One flat record in the search index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchDocument {
    /// Unique document id.
    pub id: DocumentId,
    /// Full `vendor/project` name.
    pub name: String,
    /// Name without the vendor prefix.
    pub package_name: String,
    /// Description without control characters.
    pub description: String,
    /// Package type.
    #[serde(rename = "type")]
    pub package_type: String,
    /// Repository URL, empty for virtual packages.
    pub repository: String,
    /// Repository language.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Normalised tags.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// `1` when abandoned, else `0`.
    pub abandoned: u8,
    /// Replacement package for abandoned packages, else empty.
    #[serde(rename = "replacementPackage")]
    pub replacement_package: String,
    /// Lifetime downloads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloads: Option<u64>,
    /// Favorite count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favers: Option<u64>,
    /// See [`popularity`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popularity: Option<i64>,
    /// See [`trendiness`].
    pub trendiness: f64,
}

/// Build the document for a registered package.
///
/// # Errors
///
/// Returns [`DocumentError::EmptyName`] if the package name is blank.
pub fn build<S: AsRef<str>>(
    package: &Package,
    tags: &[S],
    ranking: &RankingInputs,
) -> Result<SearchDocument, DocumentError> {
    if package.name.trim().is_empty() {
        return Err(DocumentError::EmptyName(package.id));
    }

    let (abandoned, replacement_package) = if package.abandoned {
        (1, package.replacement_package.clone().unwrap_or_default())
    } else {
        (0, String::new())
    };

    Ok(SearchDocument {
        id: DocumentId::Package(package.id),
        name: package.name.clone(),
        package_name: package.package_name().to_owned(),
        description: strip_control_chars(package.description.as_deref().unwrap_or_default()),
        package_type: package
            .package_type
            .clone()
            .unwrap_or_else(|| DEFAULT_PACKAGE_TYPE.to_owned()),
        repository: package.repository.clone().unwrap_or_default(),
        language: package.language.clone(),
        tags: normalize_tags(tags),
        abandoned,
        replacement_package,
        downloads: Some(ranking.total_downloads),
        favers: Some(ranking.favers),
        popularity: Some(popularity(ranking.monthly_downloads, package.github_stars)),
        trendiness: trendiness(ranking.trending_score),
    })
}

/// Build the placeholder document for a name some package provides.
///
/// # Errors
///
/// Returns [`DocumentError::InvalidProvidedName`] if the name is blank or
/// contains whitespace or control characters.
pub fn build_virtual(provided: &str) -> Result<SearchDocument, DocumentError> {
    if provided.is_empty() || provided.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(DocumentError::InvalidProvidedName(provided.to_owned()));
    }

    Ok(SearchDocument {
        id: DocumentId::Virtual(provided.to_owned()),
        name: provided.to_owned(),
        package_name: strip_vendor(provided).to_owned(),
        description: String::new(),
        package_type: VIRTUAL_PACKAGE_TYPE.to_owned(),
        repository: String::new(),
        language: None,
        tags: Vec::new(),
        abandoned: 0,
        replacement_package: String::new(),
        downloads: None,
        favers: None,
        popularity: None,
        trendiness: VIRTUAL_TRENDINESS,
    })
}
