//! Response decoder module
//!
//! Supports: CSV (incremental)
//!
//! # Overview
//!
//! [`CsvRowDecoder`] turns a CSV byte stream into header-keyed rows as the
//! bytes arrive. Records may be split across chunks, and quoted fields may
//! span lines. The first record is the header.

mod decoder;
mod types;

pub use decoder::{decode_all, CsvRowDecoder};
pub use types::{CsvOptions, ShortRowPolicy};
