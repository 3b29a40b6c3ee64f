//! Request module
//!
//! Query parameter shapes, file types and the pre-flight validator.
//!
//! # Overview
//!
//! Every call the [`Api`](crate::client::Api) makes goes through
//! [`validate`] first, so malformed requests fail locally with a client
//! error instead of reaching the server.

mod types;
mod validate;

pub use types::{FileType, Params, RequestOptions};
pub use validate::validate;
