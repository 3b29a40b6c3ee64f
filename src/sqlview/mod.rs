//! SQL view module
//!
//! Reads the CSV export of a server-side SQL view as a stream of rows.
//!
//! # Overview
//!
//! A view is read in three steps, all driven by
//! [`Api::get_sqlview`](crate::client::Api::get_sqlview):
//! 1. Discover the view type (`QUERY`, `VIEW`, `MATERIALIZED_VIEW`)
//! 2. Plan the request: `var` for queries, `criteria` and an optional
//!    materializing `execute` call for views
//! 3. Stream `data.csv` through the incremental CSV decoder

mod stream;
mod types;

pub use stream::RowStream;
pub use types::{plan, SqlViewOptions, SqlViewPlan, SqlViewType};
