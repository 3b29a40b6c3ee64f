//! Payload partitioning module
//!
//! Splits one oversized write payload of the form `{"<key>": [...]}` into
//! consecutive chunks of at most `threshold` elements, each sent as its own
//! request.
//!
//! # Overview
//!
//! - [`PartitionPayload`] validates the payload shape up front
//! - [`Threshold`] is the maximum chunk length, at least 2
//! - [`PartitionPayload::chunks`] yields `{"<key>": [...]}` objects in
//!   list order; concatenating them reproduces the original list

mod types;

pub use types::{Chunks, PartitionPayload, Threshold};
