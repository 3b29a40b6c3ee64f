//! HTTP client module
//!
//! The transport underneath the [`Api`](crate::client::Api) facade.
//!
//! # Features
//!
//! - **Basic Authentication**: Credentials applied to every request
//! - **Rate Limiting**: Optional token bucket rate limiter using governor
//! - **Pass-through Timeouts**: Per-request timeout overrides
//!
//! The client sends exactly one request per call. It neither retries nor
//! interprets the response status; that is left to the caller.

mod client;
mod rate_limit;

pub use client::{
    Credentials, HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig,
};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
