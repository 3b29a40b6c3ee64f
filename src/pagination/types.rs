//! Pagination types and traits
//!
//! Defines the page size, the pager block read from each response, the two
//! response layouts and the source a paginator fetches from.

use crate::error::{Error, Result};
use crate::request::Params;
use crate::types::JsonValue;
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Endpoint whose responses nest the pager under `metaData`
pub const ANALYTICS_ENDPOINT: &str = "analytics";

/// Item list key used by the analytics layout
pub const ANALYTICS_ROWS_KEY: &str = "rows";

// ============================================================================
// Page Size
// ============================================================================

/// Number of items requested per page, always positive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageSize(u32);

impl PageSize {
    /// Default page size
    pub const DEFAULT: PageSize = PageSize(50);

    /// Create a page size, rejecting zero
    pub fn new(size: u32) -> Result<Self> {
        if size == 0 {
            return Err(Error::client("page_size must be a positive integer"));
        }
        Ok(Self(size))
    }

    /// The raw value
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<i64> for PageSize {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        let size = u32::try_from(value).map_err(|_| {
            Error::client(format!("page_size must be a positive integer, got {value}"))
        })?;
        Self::new(size)
    }
}

impl FromStr for PageSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let value: i64 = s.trim().parse().map_err(|_| {
            Error::client(format!("page_size must be a positive integer, got '{s}'"))
        })?;
        Self::try_from(value)
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Pager
// ============================================================================

/// The pager block embedded in every paged response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagerInfo {
    /// Current page, 1-based
    pub page: u32,
    /// Total number of pages
    pub page_count: u32,
    /// Total number of items, when reported
    #[serde(default)]
    pub total: Option<u64>,
    /// Page size echoed by the server
    #[serde(default)]
    pub page_size: Option<u32>,
}

/// Where the pager and the item list live in a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagerLayout {
    /// `{"pager": {...}, "<key>": [...]}`
    Collection {
        /// Collection key, the first path segment of the endpoint
        key: String,
    },
    /// `{"metaData": {"pager": {...}}, "rows": [...]}`
    Analytics,
}

impl PagerLayout {
    /// Pick the layout for an endpoint
    pub fn for_endpoint(endpoint: &str) -> Self {
        if endpoint == ANALYTICS_ENDPOINT {
            return Self::Analytics;
        }
        let key = endpoint.split('/').next().unwrap_or(endpoint);
        Self::Collection {
            key: key.to_string(),
        }
    }

    /// Key holding the item list
    pub fn key(&self) -> &str {
        match self {
            Self::Collection { key } => key,
            Self::Analytics => ANALYTICS_ROWS_KEY,
        }
    }

    /// Read the pager block from a page
    pub fn pager(&self, page: &JsonValue) -> Result<PagerInfo> {
        let pager = match self {
            Self::Collection { .. } => page.get("pager"),
            Self::Analytics => page.get("metaData").and_then(|m| m.get("pager")),
        };

        let pager = pager.ok_or_else(|| {
            let location = match self {
                Self::Collection { .. } => "pager",
                Self::Analytics => "metaData.pager",
            };
            Error::decode(format!("response has no `{location}` block"))
        })?;

        serde_json::from_value(pager.clone())
            .map_err(|e| Error::decode(format!("invalid pager block: {e}")))
    }

    /// Move the item list out of a page
    pub fn take_items(&self, page: JsonValue) -> Result<Vec<JsonValue>> {
        let key = self.key();
        match page {
            JsonValue::Object(mut map) => match map.remove(key) {
                Some(JsonValue::Array(items)) => Ok(items),
                Some(_) => Err(Error::decode(format!("`{key}` is not a list"))),
                None => Err(Error::decode(format!("response has no `{key}` list"))),
            },
            _ => Err(Error::decode("page is not a JSON object")),
        }
    }
}

// ============================================================================
// Page Source
// ============================================================================

/// Something that can fetch one page of an endpoint
///
/// Implemented by [`Api`](crate::client::Api); the paginator only borrows it.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch `endpoint` as JSON with the given query parameters
    async fn fetch_page(&self, endpoint: &str, params: &Params) -> Result<JsonValue>;
}
