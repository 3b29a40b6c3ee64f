//! Pre-flight request validation

use super::types::{FileType, Params};
use crate::error::{Error, Result};
use crate::types::JsonValue;

/// Validate a request before calling the API
///
/// Checks the endpoint, the requested file type, the parameter keys and the
/// payload shape. Pure: no I/O, no side effects.
pub fn validate(
    endpoint: &str,
    file_type: &str,
    data: Option<&JsonValue>,
    params: Option<&Params>,
) -> Result<FileType> {
    if endpoint.trim().is_empty() {
        return Err(Error::client("Must submit `endpoint` for DHIS2 API"));
    }

    let file_type: FileType = file_type.parse()?;

    if let Some(params) = params {
        if params.keys().any(|k| k.trim().is_empty()) {
            return Err(Error::client("`params` keys must be non-empty strings"));
        }
    }

    if let Some(data) = data {
        if !data.is_object() {
            return Err(Error::client(format!(
                "`data` must be a JSON object, not {}",
                json_kind(data)
            )));
        }
    }

    Ok(file_type)
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
