//! Helpers for rendering typed values into response bodies.

use serde::Serialize;
use serde_json::Value;

/// Serializes a value into JSON, logging and yielding `null` on failure.
///
/// Derived `Serialize` implementations over plain data do not fail; this
/// keeps view projections infallible for nested non-media types.
pub fn to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "value could not be rendered");
        Value::Null
    })
}
