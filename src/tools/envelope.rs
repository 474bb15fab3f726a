//! The `{ success, ... }` objects every tool returns.

use crate::error::GuestError;
use serde_json::{json, Value};

/// A successful result carrying command output.
#[must_use]
pub fn output(text: impl Into<String>) -> Value {
    json!({ "success": true, "output": text.into() })
}

/// A successful result carrying a status message.
#[must_use]
pub fn message(text: impl Into<String>) -> Value {
    json!({ "success": true, "message": text.into() })
}

/// A failed result for a guest error.
#[must_use]
pub fn failure(error: &GuestError) -> Value {
    json!({
        "success": false,
        "error": error.to_string(),
        "error_kind": error.kind_tag(),
    })
}

/// A failed result from a kind tag and text.
#[must_use]
pub fn failure_with_kind(kind: &str, text: impl Into<String>) -> Value {
    json!({ "success": false, "error": text.into(), "error_kind": kind })
}

/// Reads the `success` flag; anything else counts as failure.
#[must_use]
pub fn is_success(value: &Value) -> bool {
    value.get("success").and_then(Value::as_bool).unwrap_or(false)
}
