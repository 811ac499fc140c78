//! The per-request search query value.

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PER_PAGE: u32 = 15;

/// Largest page size the single-query form accepts.
pub const MAX_PER_PAGE: u32 = 100;

/// Fields results may be sorted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    /// Lifetime downloads.
    Downloads,
    /// Favorite count.
    Favers,
}

impl SortField {
    /// Index field name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Downloads => "downloads",
            Self::Favers => "favers",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl SortOrder {
    /// Engine keyword for the direction.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// One validated `orderBys` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    /// Field to sort on.
    pub field: SortField,
    /// Direction.
    pub order: SortOrder,
}

impl OrderBy {
    /// Accept only `downloads`/`favers` with `asc`/`desc`; anything else is `None`.
    #[must_use]
    pub fn parse(sort: &str, order: &str) -> Option<Self> {
        let field = match sort {
            "downloads" => SortField::Downloads,
            "favers" => SortField::Favers,
            _ => return None,
        };
        let order = match order {
            "asc" => SortOrder::Asc,
            "desc" => SortOrder::Desc,
            _ => return None,
        };
        Some(Self { field, order })
    }
}

/// A search request after the adapter has parsed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Free text, may be empty.
    pub query: String,
    /// Tags every hit must carry.
    pub tags: Vec<String>,
    /// Comma-joined type filter; empty means no filter.
    pub type_filter: String,
    /// Page size, at least 1.
    pub per_page: u32,
    /// 0-based page number.
    pub page: u32,
    /// Sort clauses, applied in order.
    pub order_bys: Vec<OrderBy>,
}

impl Query {
    /// First page of results for `query` with no filters.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            tags: Vec::new(),
            type_filter: String::new(),
            per_page: DEFAULT_PER_PAGE,
            page: 0,
            order_bys: Vec::new(),
        }
    }

    /// Replace the tag filter.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Replace the type filter.
    #[must_use]
    pub fn with_type(mut self, type_filter: impl Into<String>) -> Self {
        self.type_filter = type_filter.into();
        self
    }

    /// Set the page size; zero is raised to one.
    #[must_use]
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    /// Set the 0-based page.
    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Replace the sort clauses.
    #[must_use]
    pub fn with_order_bys(mut self, order_bys: Vec<OrderBy>) -> Self {
        self.order_bys = order_bys;
        self
    }

    /// Individual type tokens of the comma-joined filter, blanks skipped.
    #[must_use]
    pub fn types(&self) -> Vec<&str> {
        self.type_filter.split(',').filter(|t| !t.is_empty()).collect()
    }
}
