//! Raw string coercion used by generated context constructors.
//!
//! Path, query and header values arrive as text. These functions are the
//! parse step of each scalar kind; generated code pairs a `None` result with
//! an [`InvalidFieldType`](crate::FieldError::InvalidFieldType) error naming
//! the expected kind.

/// Delimiter separating array elements in a raw parameter value.
pub const ARRAY_DELIMITER: char = ',';

/// Parses a boolean.
///
/// Accepts `1`, `t`, `T`, `true`, `TRUE`, `True` and their false
/// counterparts `0`, `f`, `F`, `false`, `FALSE`, `False`.
///
/// ## Examples
///
/// ```
/// use modelsmith::coerce::boolean;
///
/// assert_eq!(boolean("true"), Some(true));
/// assert_eq!(boolean("F"), Some(false));
/// assert_eq!(boolean("yes"), None);
/// ```
pub fn boolean(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Parses a signed 64-bit integer.
pub fn integer(raw: &str) -> Option<i64> {
    raw.parse().ok()
}

/// Parses a 64-bit float.
pub fn number(raw: &str) -> Option<f64> {
    raw.parse().ok()
}

/// Splits a raw array value into its element texts.
///
/// ## Examples
///
/// ```
/// use modelsmith::coerce::split;
///
/// assert_eq!(split("a,b,,c"), vec!["a", "b", "", "c"]);
/// assert_eq!(split(""), vec![""]);
/// ```
pub fn split(raw: &str) -> Vec<&str> {
    raw.split(ARRAY_DELIMITER).collect()
}
