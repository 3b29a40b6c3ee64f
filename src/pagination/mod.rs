//! Pagination module
//!
//! Turns a server that exposes numbered pages of JSON into a lazy page
//! stream, or into one merged result.
//!
//! # Overview
//!
//! Two response layouts are understood:
//! - **Collection**: `{"pager": {...}, "<collection>": [...]}` where the
//!   collection key is the first path segment of the endpoint
//! - **Analytics**: `{"metaData": {"pager": {...}}, "rows": [...]}`
//!
//! The paginator owns the `pageSize`, `page` and `totalPages` query
//! parameters; a caller-supplied `paging` parameter is rejected.

mod paginator;
mod types;

pub use paginator::{PageStream, Paginator};
pub use types::{
    PageSize, PageSource, PagerInfo, PagerLayout, ANALYTICS_ENDPOINT, ANALYTICS_ROWS_KEY,
};
