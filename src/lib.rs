// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # dhis2
//!
//! An async client for the DHIS2 Web API.
//!
//! ## Features
//!
//! - **Validated Requests**: Endpoint, file type, params and payload are
//!   checked before anything goes over the wire
//! - **Paging**: Numbered pages as a lazy stream, or merged into one result
//! - **Partitioned Imports**: Oversized payloads posted in bounded chunks,
//!   stopping at the first failure
//! - **SQL Views**: CSV exports streamed row by row
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dhis2::{Api, PageSize, Result};
//! use futures::TryStreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let api = Api::new("play.dhis2.org/demo", "admin", "district")?;
//!     println!("{}", api.version().await?);
//!
//!     let mut pages = api
//!         .get_paged("organisationUnits", None, PageSize::new(100)?)
//!         .await?;
//!     while let Some(page) = pages.try_next().await? {
//!         println!("{}", page["pager"]["page"]);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Api (client)                          │
//! │  get / post / put / patch / delete    info() (cached)        │
//! └──────────────────────────────────────────────────────────────┘
//!          │                │                 │
//! ┌────────┴──────┬─────────┴──────┬──────────┴──────┬───────────┐
//! │  Paginator    │  Partitioner   │  SQL view       │ Validator │
//! ├───────────────┼────────────────┼─────────────────┼───────────┤
//! │ Collection    │ {key: [..]}    │ QUERY / VIEW    │ endpoint  │
//! │ Analytics     │ ≤ threshold    │ CSV row stream  │ file type │
//! └───────────────┴────────────────┴─────────────────┴───────────┘
//!                              │
//!            HttpClient (reqwest, basic auth, rate limit)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the client
pub mod error;

/// Common types and type aliases
pub mod types;

/// Request validation, params and options
pub mod request;

/// HTTP transport with basic auth and rate limiting
pub mod http;

/// Page-number pagination
pub mod pagination;

/// Payload partitioning
pub mod partition;

/// Incremental CSV decoding
pub mod decode;

/// SQL view row streaming
pub mod sqlview;

/// The `Api` client facade
pub mod client;

/// Auth file discovery and loading
pub mod config;

/// Version, UID and JSON helpers
pub mod utils;

/// Logging setup
pub mod logging;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::{Api, ApiBuilder};
pub use error::{Error, Result};
pub use pagination::PageSize;
pub use partition::Threshold;
pub use request::{Params, RequestOptions};
pub use sqlview::SqlViewOptions;
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
