//! Field-level errors raised while building typed values from raw input.

use std::fmt;

use serde::Serialize;
use strum::Display;
use thiserror::Error;

/// Where a missing or malformed value was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "lowercase")]
pub enum Location {
    Param,
    Header,
    Payload,
    Response,
}

/// A single coercion or validation failure.
///
/// ## Examples
///
/// ```
/// use modelsmith::FieldError;
///
/// let err = FieldError::invalid_type("count", "abc", "integer");
/// assert_eq!(
///     err.to_string(),
///     "invalid value \"abc\" for \"count\", must be a integer"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum FieldError {
    /// A required value was absent or empty.
    #[error("missing required {location} \"{name}\"")]
    MissingRequiredField { name: String, location: Location },

    /// A raw value could not be converted to the declared kind.
    #[error("invalid value \"{value}\" for \"{name}\", must be a {expected}")]
    InvalidFieldType {
        name: String,
        value: String,
        expected: String,
    },

    /// A typed value broke a declared validation rule.
    #[error("{name} {reason}")]
    ValidationFailed { name: String, reason: String },
}

impl FieldError {
    pub fn missing_param(name: impl Into<String>) -> Self {
        Self::MissingRequiredField {
            name: name.into(),
            location: Location::Param,
        }
    }

    pub fn missing_header(name: impl Into<String>) -> Self {
        Self::MissingRequiredField {
            name: name.into(),
            location: Location::Header,
        }
    }

    pub fn missing_field(name: impl Into<String>, location: Location) -> Self {
        Self::MissingRequiredField {
            name: name.into(),
            location,
        }
    }

    pub fn invalid_type(
        name: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidFieldType {
            name: name.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }

    pub fn validation(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ValidationFailed {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Name of the offending field, header or parameter.
    pub fn name(&self) -> &str {
        match self {
            Self::MissingRequiredField { name, .. }
            | Self::InvalidFieldType { name, .. }
            | Self::ValidationFailed { name, .. } => name,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::MissingRequiredField { .. })
    }

    pub fn is_invalid_type(&self) -> bool {
        matches!(self, Self::InvalidFieldType { .. })
    }
}

/// An ordered aggregate of [`FieldError`]s.
///
/// Parameter coercion keeps going after a failure and pushes every error it
/// meets into one `FieldErrors`; the caller decides afterwards whether the
/// aggregate is fatal.
///
/// ## Examples
///
/// ```
/// use modelsmith::{FieldError, FieldErrors};
///
/// let mut errors = FieldErrors::new();
/// assert!(errors.clone().into_result().is_ok());
///
/// errors.push(FieldError::missing_param("id"));
/// errors.push(FieldError::invalid_type("count", "x", "integer"));
/// assert_eq!(errors.len(), 2);
/// assert!(errors.into_result().is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    /// Appends every error of `other`.
    pub fn merge(&mut self, other: FieldErrors) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.errors.iter()
    }

    pub fn first(&self) -> Option<&FieldError> {
        self.errors.first()
    }

    /// Returns `Ok(())` when empty, the aggregate otherwise.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<FieldError> for FieldErrors {
    fn from(error: FieldError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl IntoIterator for FieldErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a FieldErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_errors_in_order() {
        let mut errors = FieldErrors::new();
        errors.push(FieldError::missing_header("X-Account"));
        errors.push(FieldError::validation("name", "length must be at least 2"));
        assert_eq!(
            errors.to_string(),
            "missing required header \"X-Account\"; name length must be at least 2"
        );
    }

    #[test]
    fn merge_preserves_order() {
        let mut a = FieldErrors::from(FieldError::missing_param("a"));
        let b = FieldErrors::from(FieldError::missing_param("b"));
        a.merge(b);
        let names: Vec<_> = a.iter().map(FieldError::name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn error_kind_predicates() {
        assert!(FieldError::missing_param("x").is_missing());
        assert!(FieldError::invalid_type("x", "y", "number").is_invalid_type());
        assert!(!FieldError::validation("x", "bad").is_missing());
    }

    #[test]
    fn serializes_with_error_tag() {
        let json = serde_json::to_value(FieldError::invalid_type("count", "abc", "integer")).unwrap();
        assert_eq!(json["error"], "invalid_field_type");
        assert_eq!(json["value"], "abc");
    }
}
