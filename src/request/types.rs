//! Request types
//!
//! Defines query parameters, file types and per-request options.

use crate::error::{Error, Result};
use crate::types::{JsonValue, StringMap};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

// ============================================================================
// File Type
// ============================================================================

/// File type requested from a GET endpoint (appended as `.{ext}`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileType {
    /// `.json`
    #[default]
    Json,
    /// `.csv`
    Csv,
    /// `.xml`
    Xml,
    /// `.pdf`
    Pdf,
    /// `.xlsx`
    Xlsx,
}

impl FileType {
    /// File extension used in the request URL
    pub fn extension(self) -> &'static str {
        match self {
            FileType::Json => "json",
            FileType::Csv => "csv",
            FileType::Xml => "xml",
            FileType::Pdf => "pdf",
            FileType::Xlsx => "xlsx",
        }
    }
}

impl FromStr for FileType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(FileType::Json),
            "csv" => Ok(FileType::Csv),
            "xml" => Ok(FileType::Xml),
            "pdf" => Ok(FileType::Pdf),
            "xlsx" => Ok(FileType::Xlsx),
            _ => Err(Error::client(format!("Invalid file_type: {s}"))),
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

// ============================================================================
// Params
// ============================================================================

/// HTTP query parameters
///
/// Either a key-unique map, or an ordered list of pairs for endpoints that
/// need repeated keys (e.g. several `dimension=` entries on `analytics`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Params {
    /// Unique keys
    Map(StringMap),
    /// Ordered pairs, keys may repeat
    Pairs(Vec<(String, String)>),
}

impl Default for Params {
    fn default() -> Self {
        Self::Map(StringMap::new())
    }
}

impl Params {
    /// Create an empty key-unique parameter map
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pair list (repeated keys allowed)
    pub fn pairs() -> Self {
        Self::Pairs(Vec::new())
    }

    /// Add a parameter, keeping the builder style
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.push(key, value);
        self
    }

    /// Add a parameter
    ///
    /// On a map this replaces an existing value, on a pair list it appends.
    pub fn push(&mut self, key: impl Into<String>, value: impl ToString) {
        match self {
            Params::Map(map) => {
                map.insert(key.into(), value.to_string());
            }
            Params::Pairs(pairs) => pairs.push((key.into(), value.to_string())),
        }
    }

    /// Set a parameter, replacing every existing entry with that key
    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        let key = key.into();
        match self {
            Params::Map(map) => {
                map.insert(key, value.to_string());
            }
            Params::Pairs(pairs) => {
                pairs.retain(|(k, _)| *k != key);
                pairs.push((key, value.to_string()));
            }
        }
    }

    /// Check whether a key is present
    pub fn contains_key(&self, key: &str) -> bool {
        match self {
            Params::Map(map) => map.contains_key(key),
            Params::Pairs(pairs) => pairs.iter().any(|(k, _)| k == key),
        }
    }

    /// All values for a key, in order
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        match self {
            Params::Map(map) => map.get(key).map(String::as_str).into_iter().collect(),
            Params::Pairs(pairs) => pairs
                .iter()
                .filter(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
                .collect(),
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        match self {
            Params::Map(map) => map.len(),
            Params::Pairs(pairs) => pairs.len(),
        }
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over the keys
    pub fn keys(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match self {
            Params::Map(map) => Box::new(map.keys().map(String::as_str)),
            Params::Pairs(pairs) => Box::new(pairs.iter().map(|(k, _)| k.as_str())),
        }
    }

    /// Flatten into query pairs for the transport
    pub fn to_query(&self) -> Vec<(String, String)> {
        match self {
            Params::Map(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            Params::Pairs(pairs) => pairs.clone(),
        }
    }
}

impl From<StringMap> for Params {
    fn from(map: StringMap) -> Self {
        Self::Map(map)
    }
}

impl<K: Into<String>, V: Into<String>> From<Vec<(K, V)>> for Params {
    fn from(pairs: Vec<(K, V)>) -> Self {
        Self::Pairs(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Params {
    fn from(pairs: [(K, V); N]) -> Self {
        Self::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

// ============================================================================
// Request Options
// ============================================================================

/// Options for a single API call
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Requested file type (validated against the whitelist)
    pub file_type: String,
    /// Query parameters
    pub params: Option<Params>,
    /// JSON payload
    pub json: Option<JsonValue>,
    /// Override timeout for this request
    pub timeout: Option<Duration>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            file_type: FileType::Json.extension().to_string(),
            params: None,
            json: None,
            timeout: None,
        }
    }
}

impl RequestOptions {
    /// Create default options (JSON, no params, no body)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the file type
    #[must_use]
    pub fn file_type(mut self, file_type: impl Into<String>) -> Self {
        self.file_type = file_type.into();
        self
    }

    /// Set query parameters
    #[must_use]
    pub fn params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }

    /// Set optional query parameters
    #[must_use]
    pub fn maybe_params(mut self, params: Option<&Params>) -> Self {
        self.params = params.cloned();
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: JsonValue) -> Self {
        self.json = Some(body);
        self
    }

    /// Set timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
