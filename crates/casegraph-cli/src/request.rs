//! Request parsing and response shaping at the CLI boundary.

use casegraph_core::{CaseError, QueryParams};
use serde::Deserialize;
use serde_json::{json, Value};

/// Body of the `query` command, read from stdin.
#[derive(Debug, Default, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub cypher: String,

    #[serde(default)]
    pub params: QueryParams,
}

impl QueryRequest {
    /// Parse a request body. Blank input is an empty request, which the
    /// service rejects as a missing `cypher` field.
    pub fn parse(input: &str) -> Result<Self, CaseError> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(input).map_err(|e| CaseError::InvalidRequest(e.to_string()))
    }
}

/// Parse a `key=value` relation attribute.
pub fn parse_attr(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got {raw:?}")),
    }
}

/// Process exit code for a failed request: 2 for missing or malformed input,
/// 1 otherwise.
pub fn exit_code(err: &CaseError) -> u8 {
    if err.is_client_error() {
        2
    } else {
        1
    }
}

/// JSON error body carrying the human-readable reason.
pub fn error_body(err: &CaseError) -> Value {
    json!({ "error": err.to_string() })
}
