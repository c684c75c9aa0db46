//! Wire types of the PNC REST API

use serde::{Deserialize, Serialize};

/// Single-entity envelope used by PNC endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Singleton<T> {
    pub content: T,
}

/// One page of a collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default)]
    pub page_index: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
}

impl<T> Page<T> {
    /// Empty page answering `query`; PNC replies `204 No Content` when nothing matches
    pub fn empty(query: &PageQuery) -> Self {
        Self {
            page_index: query.index,
            page_size: query.size,
            total_pages: 0,
            content: Vec::new(),
        }
    }
}

/// Sort direction applied by the backend to a single field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortOrder {
    Asc(String),
    Desc(String),
}

impl SortOrder {
    pub fn desc(field: impl Into<String>) -> Self {
        Self::Desc(field.into())
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::Asc(field.into())
    }

    /// Render as the value of PNC's `sort` query parameter, e.g. `=desc=id`
    pub fn to_query_value(&self) -> String {
        match self {
            Self::Asc(field) => format!("=asc={field}"),
            Self::Desc(field) => format!("=desc={field}"),
        }
    }
}

/// Page descriptor sent with every collection query.
///
/// Filtering and sorting happen on the server; nothing here is validated
/// client side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub index: u32,
    pub size: u32,
    pub search: String,
    pub sort: Option<SortOrder>,
}

impl PageQuery {
    pub fn new(index: u32, size: u32) -> Self {
        Self {
            index,
            size,
            search: String::new(),
            sort: None,
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Query-string pairs in the order PNC documents them
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("pageIndex", self.index.to_string()),
            ("pageSize", self.size.to_string()),
        ];
        if !self.search.is_empty() {
            params.push(("search", self.search.clone()));
        }
        if let Some(sort) = &self.sort {
            params.push(("sort", sort.to_query_value()));
        }
        params
    }
}

/// Build record status as reported by the backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildStatus {
    Success,
    Failed,
    Unstable,
    Building,
    Rejected,
    Cancelled,
    SystemError,
    #[default]
    #[serde(other)]
    Unknown,
}

impl BuildStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Failed => "Failed",
            Self::Unstable => "Unstable",
            Self::Building => "Building",
            Self::Rejected => "Rejected",
            Self::Cancelled => "Cancelled",
            Self::SystemError => "System error",
            Self::Unknown => "Unknown",
        }
    }
}

/// A build record; consumed as-is for display
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BuildRecord {
    pub id: i64,
    #[serde(default)]
    pub build_configuration_id: Option<i64>,
    #[serde(default)]
    pub build_configuration_name: Option<String>,
    #[serde(default)]
    pub status: BuildStatus,
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub start_time: Option<i64>,
    #[serde(default)]
    pub end_time: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
}

/// A PNC user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Error body returned by PNC on failures
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}
