//! Small helpers around the API: version parsing, UID checks, JSON cleanup
//! and local file loading.

use crate::error::{Error, Result};
use crate::types::{JsonValue, Row};
use rand::Rng;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static UID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]{10}$").unwrap());

const UID_LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const UID_ALPHANUMERIC: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const UID_LENGTH: usize = 11;

/// Minor version number from a `system/info` version string
///
/// `"2.30"` → 30, `"2.30-SNAPSHOT"` → 30, `"2.31-RC1"` → 31,
/// `"2.31.1"` → 31. Returns `None` if it cannot be parsed.
pub fn version_to_int(value: &str) -> Option<u32> {
    let value = value.replace("-SNAPSHOT", "");
    let value = value.split("-RC").next().unwrap_or_default();
    value.split('.').nth(1)?.parse().ok()
}

/// Generate a random UID: a letter followed by 10 alphanumerics
pub fn generate_uid() -> String {
    let mut rng = rand::thread_rng();
    let mut uid = String::with_capacity(UID_LENGTH);
    uid.push(char::from(UID_LETTERS[rng.gen_range(0..UID_LETTERS.len())]));
    for _ in 1..UID_LENGTH {
        uid.push(char::from(
            UID_ALPHANUMERIC[rng.gen_range(0..UID_ALPHANUMERIC.len())],
        ));
    }
    uid
}

/// Check a string against the UID format: a letter followed by 10 alphanumerics
pub fn is_valid_uid(uid: &str) -> bool {
    UID_PATTERN.is_match(uid)
}

/// Recursively remove keys from nested JSON
///
/// Object entries with a matching key are dropped at every depth. String
/// items of a list that equal one of the keys are dropped as well.
pub fn clean_obj<S: AsRef<str>>(obj: JsonValue, remove: &[S]) -> JsonValue {
    let should_remove = |key: &str| remove.iter().any(|r| r.as_ref() == key);

    match obj {
        JsonValue::Object(map) => JsonValue::Object(
            map.into_iter()
                .filter(|(key, _)| !should_remove(key))
                .map(|(key, value)| (key, clean_obj(value, remove)))
                .collect(),
        ),
        JsonValue::Array(items) => JsonValue::Array(
            items
                .into_iter()
                .filter(|item| !item.as_str().is_some_and(should_remove))
                .map(|item| clean_obj(item, remove))
                .collect(),
        ),
        other => other,
    }
}

/// Load a JSON file
pub fn load_json(path: impl AsRef<Path>) -> Result<JsonValue> {
    let path = path.as_ref();
    let content = std::fs::read(path)
        .map_err(|_| Error::client(format!("File not found: {}", path.display())))?;
    Ok(serde_json::from_slice(&content)?)
}

/// Load a CSV file into header-keyed rows
pub fn load_csv(path: impl AsRef<Path>, delimiter: u8) -> Result<Vec<Row>> {
    let path = path.as_ref();
    let content = std::fs::read(path)
        .map_err(|_| Error::client(format!("File not found: {}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(content.as_slice());
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.to_string(), v.to_string()))
                .collect(),
        );
    }
    Ok(rows)
}
