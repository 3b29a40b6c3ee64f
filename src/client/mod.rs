//! Client facade module
//!
//! [`Api`] is the entry point: it owns the transport, builds URLs from the
//! base URL and API version, validates every request before sending it and
//! maps non-success responses to [`Error::Request`](crate::error::Error::Request).
//!
//! # Example
//!
//! ```no_run
//! use dhis2::client::Api;
//! use dhis2::pagination::PageSize;
//!
//! # async fn run() -> dhis2::error::Result<()> {
//! let api = Api::new("play.dhis2.org/demo", "admin", "district")?;
//! let units = api
//!     .get_paged_merged("organisationUnits", None, PageSize::new(100)?)
//!     .await?;
//! println!("{}", units["organisationUnits"].as_array().map_or(0, Vec::len));
//! # Ok(())
//! # }
//! ```

mod api;
mod base_url;

pub use api::{Api, ApiBuilder, ResponseStream, SqlViewRows, MIN_API_VERSION};
pub use base_url::normalize_base_url;

#[cfg(test)]
mod tests;
