//! Query descriptors, results and pagination metadata

use crate::core::error::QueryError;
use crate::core::field::FieldValue;
use crate::core::record::Record;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Page size used when a caller does not ask for one
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl FromStr for SortDirection {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            other => Err(QueryError::InvalidSort {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Ascending => f.write_str("asc"),
            SortDirection::Descending => f.write_str("desc"),
        }
    }
}

/// Everything a single filter/sort/page request asks for
///
/// # Example
/// ```rust,ignore
/// let query = QueryDescriptor::new()
///     .search("jo", ["name"])
///     .filter_eq("status", "Active")
///     .filter_min("grade", 80.0)
///     .sort_by("grade", SortDirection::Descending)
///     .page(1, 20);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    /// Substring to look for; empty means no text filter
    #[serde(default)]
    pub search_text: String,

    /// Fields searched for `search_text`; a record matches if any of them does
    #[serde(default)]
    pub search_fields: Vec<String>,

    /// Fields that must equal the given value
    #[serde(default)]
    pub equality_filters: IndexMap<String, FieldValue>,

    /// Numeric fields that must be greater than or equal to the given value
    #[serde(default)]
    pub min_value_filters: IndexMap<String, f64>,

    /// Numeric fields that must be less than or equal to the given value
    #[serde(default)]
    pub max_value_filters: IndexMap<String, f64>,

    /// Field to sort by; `None` keeps the input order
    #[serde(default)]
    pub sort_key: Option<String>,

    #[serde(default)]
    pub sort_direction: SortDirection,

    /// 1-based page number
    pub page: usize,

    pub page_size: usize,
}

impl Default for QueryDescriptor {
    fn default() -> Self {
        Self {
            search_text: String::new(),
            search_fields: Vec::new(),
            equality_filters: IndexMap::new(),
            min_value_filters: IndexMap::new(),
            max_value_filters: IndexMap::new(),
            sort_key: None,
            sort_direction: SortDirection::Ascending,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl QueryDescriptor {
    /// A descriptor with no filters, no sort, first page of the default size
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search<I, S>(mut self, text: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_text = text.into();
        self.search_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn filter_eq(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.equality_filters.insert(field.into(), value.into());
        self
    }

    pub fn filter_min(mut self, field: impl Into<String>, min: f64) -> Self {
        self.min_value_filters.insert(field.into(), min);
        self
    }

    pub fn filter_max(mut self, field: impl Into<String>, max: f64) -> Self {
        self.max_value_filters.insert(field.into(), max);
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_key = Some(field.into());
        self.sort_direction = direction;
        self
    }

    pub fn page(mut self, page: usize, page_size: usize) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    /// Index of the first item on the requested page
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }

    /// Whether the descriptor filters on text at all
    pub fn has_search(&self) -> bool {
        !self.search_text.is_empty()
    }

    /// Boundary check performed before a query runs
    ///
    /// The pipeline itself assumes `page >= 1` and `page_size >= 1`.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.page == 0 {
            return Err(QueryError::InvalidPage { page: self.page });
        }
        if self.page_size == 0 {
            return Err(QueryError::InvalidPageSize {
                page_size: self.page_size,
            });
        }
        Ok(())
    }
}

/// Total number of pages for `total` items
///
/// Zero items means zero pages; a zero page size also yields zero.
pub fn total_pages(total: usize, page_size: usize) -> usize {
    if total == 0 || page_size == 0 {
        0
    } else {
        total.div_ceil(page_size)
    }
}

/// One page of a filtered, sorted collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub items: Vec<Record>,

    /// Number of records that passed the filters, before slicing
    pub total_matched: usize,

    pub page: usize,

    pub page_size: usize,

    pub total_pages: usize,
}

impl QueryResult {
    pub fn new(items: Vec<Record>, total_matched: usize, page: usize, page_size: usize) -> Self {
        Self {
            items,
            total_matched,
            page,
            page_size,
            total_pages: total_pages(total_matched, page_size),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Paginated response structure
///
/// This structure wraps paginated data with metadata about pagination state.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    /// The paginated data
    pub data: Vec<T>,

    /// Pagination metadata
    pub pagination: PaginationMeta,
}

impl From<QueryResult> for PaginatedResponse<Record> {
    fn from(result: QueryResult) -> Self {
        let pagination = PaginationMeta::new(result.page, result.page_size, result.total_matched);
        Self {
            data: result.items,
            pagination,
        }
    }
}

/// Pagination metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationMeta {
    /// Current page number (starts at 1)
    pub page: usize,

    /// Number of items per page
    pub limit: usize,

    /// Total number of items (after filters)
    pub total: usize,

    /// Total number of pages
    pub total_pages: usize,

    /// Whether there is a next page
    pub has_next: bool,

    /// Whether there is a previous page
    pub has_prev: bool,
}

impl PaginationMeta {
    /// Create pagination metadata from calculation
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        let start = page.saturating_sub(1).saturating_mul(limit);

        Self {
            page,
            limit,
            total,
            total_pages: total_pages(total, limit),
            has_next: limit > 0 && start.saturating_add(limit) < total,
            has_prev: page > 1,
        }
    }
}
