//! Rendering of arbitrary values for log messages.

use serde::Serialize;

/// JSON-encode `value`, or describe why it could not be encoded.
pub fn safe_stringify<T: Serialize + ?Sized>(value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => format!("Unserializable Object {}", e),
    }
}
