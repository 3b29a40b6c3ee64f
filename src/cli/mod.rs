//! CLI module
//!
//! Command-line interface over the [`Api`](crate::client::Api) facade.
//!
//! # Commands
//!
//! - `info` - Show the server's `system/info`
//! - `get` - GET one endpoint
//! - `paged` - GET a paged collection, page by page or merged
//! - `sqlview` - Read the rows of a SQL view
//! - `post-partitioned` - POST a large payload in chunks

mod commands;
mod runner;

pub use commands::{parse_key_val, Cli, Commands};
pub use runner::Runner;
