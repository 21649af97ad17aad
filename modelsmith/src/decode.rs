//! JSON value decoding used by generated `decode` functions.
//!
//! Each function reads one JSON value as a given kind. On a kind mismatch it
//! pushes an [`InvalidFieldType`](crate::FieldError::InvalidFieldType) error
//! naming `path` and returns `None`, leaving the target untouched.

use serde_json::{Map, Value};

use crate::error::{FieldError, FieldErrors};

fn mismatch(path: &str, value: &Value, expected: &str, errors: &mut FieldErrors) {
    errors.push(FieldError::invalid_type(path, value.to_string(), expected));
}

pub fn boolean(value: &Value, path: &str, errors: &mut FieldErrors) -> Option<bool> {
    let decoded = value.as_bool();
    if decoded.is_none() {
        mismatch(path, value, "boolean", errors);
    }
    decoded
}

/// Reads an integer. Floats with no fractional part are accepted.
///
/// ## Examples
///
/// ```
/// use modelsmith::{decode, FieldErrors};
/// use serde_json::json;
///
/// let mut errors = FieldErrors::new();
/// assert_eq!(decode::integer(&json!(3.0), "count", &mut errors), Some(3));
/// assert_eq!(decode::integer(&json!("3"), "count", &mut errors), None);
/// assert_eq!(errors.len(), 1);
/// ```
pub fn integer(value: &Value, path: &str, errors: &mut FieldErrors) -> Option<i64> {
    let decoded = value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
            .map(|f| f as i64)
    });
    if decoded.is_none() {
        mismatch(path, value, "integer", errors);
    }
    decoded
}

pub fn number(value: &Value, path: &str, errors: &mut FieldErrors) -> Option<f64> {
    let decoded = value.as_f64();
    if decoded.is_none() {
        mismatch(path, value, "number", errors);
    }
    decoded
}

pub fn string(value: &Value, path: &str, errors: &mut FieldErrors) -> Option<String> {
    let decoded = value.as_str().map(str::to_string);
    if decoded.is_none() {
        mismatch(path, value, "string", errors);
    }
    decoded
}

/// Passes any value through unchanged.
pub fn any(value: &Value, _path: &str, _errors: &mut FieldErrors) -> Option<Value> {
    Some(value.clone())
}

pub fn array<'a>(value: &'a Value, path: &str, errors: &mut FieldErrors) -> Option<&'a Vec<Value>> {
    let decoded = value.as_array();
    if decoded.is_none() {
        mismatch(path, value, "array", errors);
    }
    decoded
}

pub fn object<'a>(
    value: &'a Value,
    path: &str,
    errors: &mut FieldErrors,
) -> Option<&'a Map<String, Value>> {
    let decoded = value.as_object();
    if decoded.is_none() {
        mismatch(path, value, "object", errors);
    }
    decoded
}

/// Returns the member `name` unless it is absent or `null`.
pub fn member<'a>(object: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    object.get(name).filter(|v| !v.is_null())
}

/// Joins a parent path and a member name.
pub fn path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

/// Joins a parent path and an element index.
pub fn index(parent: &str, index: usize) -> String {
    format!("{parent}[{index}]")
}
