//! Package records and search document identifiers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::text::strip_vendor;

/// Replacement value an administrator sets on abandoned spam packages.
pub const SPAM_REPLACEMENT: &str = "spam/spam";

/// Prefix of the synthetic ids given to virtual package documents.
pub const VIRTUAL_ID_PREFIX: &str = "virtual:";

/// A registered package as read from the relational store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Database id, unique across the registry.
    pub id: i64,
    /// Full `vendor/project` name.
    pub name: String,
    /// Free-text description as submitted by the maintainer.
    pub description: Option<String>,
    /// Package type (`library`, `project`, `composer-plugin`, ...).
    pub package_type: Option<String>,
    /// Source repository URL.
    pub repository: Option<String>,
    /// Main implementation language reported by the repository host.
    pub language: Option<String>,
    /// Whether the maintainer flagged the package as abandoned.
    pub abandoned: bool,
    /// Suggested replacement; only meaningful when `abandoned` is set.
    pub replacement_package: Option<String>,
    /// GitHub star count.
    pub github_stars: u64,
    /// Last successful indexing time; `None` means the package needs indexing.
    pub indexed_at: Option<DateTime<Utc>>,
}

impl Package {
    /// The project part of the name, without the vendor prefix.
    #[must_use]
    pub fn package_name(&self) -> &str {
        strip_vendor(&self.name)
    }

    /// Abandoned packages pointing at [`SPAM_REPLACEMENT`] are removed from search.
    #[must_use]
    pub fn is_spam(&self) -> bool {
        self.abandoned && self.replacement_package.as_deref() == Some(SPAM_REPLACEMENT)
    }
}

/// Identifier of a document in the search index.
///
/// Real packages use their numeric id; virtual packages use
/// `virtual:<name>`, which can never parse as an integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentId {
    /// A registered package.
    Package(i64),
    /// A name only known through some package's `provide` section.
    Virtual(String),
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Package(id) => write!(f, "{id}"),
            Self::Virtual(name) => write!(f, "{VIRTUAL_ID_PREFIX}{name}"),
        }
    }
}

impl Serialize for DocumentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Package(id) => serializer.serialize_i64(*id),
            Self::Virtual(_) => serializer.collect_str(self),
        }
    }
}
