//! SQL view types
//!
//! Defines the view type reported by the server, the caller's options and the
//! request plan derived from both.

use crate::decode::CsvOptions;
use crate::error::{Error, Result};
use crate::request::Params;
use crate::types::StringMap;
use std::fmt;

/// Type of a SQL view as reported by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlViewType {
    /// Parameterized query, cannot be materialized
    Query,
    /// Plain database view
    View,
    /// Materialized database view
    MaterializedView,
    /// Unknown type, read like a view
    Other(String),
}

impl SqlViewType {
    /// True for `QUERY`
    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query)
    }
}

impl From<&str> for SqlViewType {
    fn from(s: &str) -> Self {
        match s {
            "QUERY" => Self::Query,
            "VIEW" => Self::View,
            "MATERIALIZED_VIEW" => Self::MaterializedView,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for SqlViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => f.write_str("QUERY"),
            Self::View => f.write_str("VIEW"),
            Self::MaterializedView => f.write_str("MATERIALIZED_VIEW"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// Options for reading a SQL view
#[derive(Debug, Clone, Default)]
pub struct SqlViewOptions {
    /// Materialize the view before reading it (views only)
    pub execute: bool,
    /// Variables for `QUERY` views
    pub var: Option<StringMap>,
    /// Column filters for views
    pub criteria: Option<StringMap>,
    /// CSV decoding options
    pub csv: CsvOptions,
}

impl SqlViewOptions {
    /// Create default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Materialize before reading
    #[must_use]
    pub fn execute(mut self, execute: bool) -> Self {
        self.execute = execute;
        self
    }

    /// Add a query variable
    #[must_use]
    pub fn var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.var
            .get_or_insert_with(StringMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Add a criteria filter
    #[must_use]
    pub fn criteria(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.criteria
            .get_or_insert_with(StringMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Set CSV decoding options
    #[must_use]
    pub fn csv(mut self, csv: CsvOptions) -> Self {
        self.csv = csv;
        self
    }
}

/// What to send once the view type is known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlViewPlan {
    /// Query parameters for the `data.csv` request
    pub params: Params,
    /// POST `sqlViews/{uid}/execute` before reading
    pub materialize: bool,
}

/// Plan the data request for a view of the given type
///
/// Fails with a client error when a `QUERY` view has no `var`, or when
/// `execute` is asked of a `QUERY` view.
pub fn plan(view_type: &SqlViewType, options: &SqlViewOptions) -> Result<SqlViewPlan> {
    if view_type.is_query() {
        let Some(var) = &options.var else {
            return Err(Error::client(
                "SQL view of type QUERY needs `var` values, e.g. var(\"key1\", \"value1\")",
            ));
        };
        if options.execute {
            return Err(Error::client(
                "SQL view of type QUERY has no view to create, `execute` must be false",
            ));
        }
        return Ok(SqlViewPlan {
            params: colon_pairs("var", var),
            materialize: false,
        });
    }

    let params = match &options.criteria {
        Some(criteria) => colon_pairs("criteria", criteria),
        None => Params::pairs(),
    };

    Ok(SqlViewPlan {
        params,
        materialize: options.execute,
    })
}

/// Repeated `name=key:value` pairs, sorted by key
fn colon_pairs(name: &str, map: &StringMap) -> Params {
    let mut entries: Vec<(&String, &String)> = map.iter().collect();
    entries.sort();

    let mut params = Params::pairs();
    for (k, v) in entries {
        params.push(name, format!("{k}:{v}"));
    }
    params
}
