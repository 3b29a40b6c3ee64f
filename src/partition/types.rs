//! Partition types
//!
//! Defines the validated payload, the chunk threshold and the chunk iterator.

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use std::fmt;

// ============================================================================
// Threshold
// ============================================================================

/// Maximum number of elements per chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Threshold(usize);

impl Threshold {
    /// Default threshold
    pub const DEFAULT: Threshold = Threshold(1000);

    /// Create a threshold, rejecting values below 2
    pub fn new(value: usize) -> Result<Self> {
        if value < 2 {
            return Err(Error::client("`thresh` must be integer of 2 or larger"));
        }
        Ok(Self(value))
    }

    /// The raw value
    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<i64> for Threshold {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        let value = usize::try_from(value)
            .map_err(|_| Error::client("`thresh` must be integer of 2 or larger"))?;
        Self::new(value)
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Payload
// ============================================================================

/// A write payload with exactly one key mapping to a non-empty list
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionPayload {
    key: String,
    items: Vec<JsonValue>,
}

impl PartitionPayload {
    /// Validate and take apart a payload
    pub fn new(payload: JsonValue) -> Result<Self> {
        let JsonValue::Object(map) = payload else {
            return Err(Error::client("Parameter `json` must be a JSON object"));
        };

        if map.is_empty() {
            return Err(Error::client("`json` is empty"));
        }
        if map.len() != 1 {
            return Err(Error::client(
                "Must submit exactly one key in payload - e.g. json={\"dataElements\": [...]}",
            ));
        }

        let Some((key, value)) = map.into_iter().next() else {
            return Err(Error::client("`json` is empty"));
        };

        match value {
            JsonValue::Array(items) if !items.is_empty() => Ok(Self { key, items }),
            JsonValue::Array(_) => Err(Error::client(format!("payload for key '{key}' is empty"))),
            _ => Err(Error::client(format!("payload for key '{key}' must be a list"))),
        }
    }

    /// The single payload key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false for a validated payload
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of chunks `threshold` produces
    pub fn chunk_count(&self, threshold: Threshold) -> usize {
        self.items.len().div_ceil(threshold.get())
    }

    /// Split into `{key: slice}` chunks of at most `threshold` elements
    pub fn chunks(self, threshold: Threshold) -> Chunks {
        Chunks {
            key: self.key,
            items: self.items.into_iter(),
            threshold,
        }
    }
}

/// Iterator over the chunks of a [`PartitionPayload`]
#[derive(Debug)]
pub struct Chunks {
    key: String,
    items: std::vec::IntoIter<JsonValue>,
    threshold: Threshold,
}

impl Iterator for Chunks {
    type Item = JsonValue;

    fn next(&mut self) -> Option<Self::Item> {
        let slice: Vec<JsonValue> = self.items.by_ref().take(self.threshold.get()).collect();
        if slice.is_empty() {
            return None;
        }

        let mut chunk = JsonObject::new();
        chunk.insert(self.key.clone(), JsonValue::Array(slice));
        Some(JsonValue::Object(chunk))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.items.len().div_ceil(self.threshold.get());
        (n, Some(n))
    }
}

impl ExactSizeIterator for Chunks {}
