//! Validation checks emitted by generated code.
//!
//! Every check pushes a [`ValidationFailed`](crate::FieldError::ValidationFailed)
//! error into the caller's aggregate instead of returning early, so one pass
//! reports every broken rule of a value.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use regex::Regex;
use serde_json::Value;

use crate::error::{FieldError, FieldErrors};

fn compiled(pattern: &str) -> Result<Regex, regex::Error> {
    static PATTERNS: OnceLock<Mutex<HashMap<String, Regex>>> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| Mutex::new(HashMap::new()));
    let mut patterns = patterns.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(re) = patterns.get(pattern) {
        return Ok(re.clone());
    }
    let re = Regex::new(pattern)?;
    patterns.insert(pattern.to_string(), re.clone());
    Ok(re)
}

/// Checks that `value` matches `pattern`.
///
/// ## Examples
///
/// ```
/// use modelsmith::{validate, FieldErrors};
///
/// let mut errors = FieldErrors::new();
/// validate::pattern(&mut errors, "code", "ab12", "^[a-z]+[0-9]+$");
/// validate::pattern(&mut errors, "code", "12ab", "^[a-z]+[0-9]+$");
/// assert_eq!(errors.len(), 1);
/// ```
pub fn pattern(errors: &mut FieldErrors, name: &str, value: &str, pattern: &str) {
    match compiled(pattern) {
        Ok(re) if re.is_match(value) => {}
        Ok(_) => errors.push(FieldError::validation(
            name,
            format!("must match the regexp \"{pattern}\" but got value \"{value}\""),
        )),
        Err(e) => errors.push(FieldError::validation(
            name,
            format!("has an invalid pattern \"{pattern}\": {e}"),
        )),
    }
}

/// Checks that `value` is one of `allowed`.
pub fn one_of(errors: &mut FieldErrors, name: &str, value: &Value, allowed: &[Value]) {
    if !allowed.contains(value) {
        let listed: Vec<String> = allowed.iter().map(Value::to_string).collect();
        errors.push(FieldError::validation(
            name,
            format!("must be one of {} but got value {value}", listed.join(", ")),
        ));
    }
}

pub fn minimum(errors: &mut FieldErrors, name: &str, value: f64, min: f64) {
    if value < min {
        errors.push(FieldError::validation(
            name,
            format!("must be greater than or equal to {min} but got value {value}"),
        ));
    }
}

pub fn maximum(errors: &mut FieldErrors, name: &str, value: f64, max: f64) {
    if value > max {
        errors.push(FieldError::validation(
            name,
            format!("must be less than or equal to {max} but got value {value}"),
        ));
    }
}

/// Checks a length (characters for strings, elements for arrays).
pub fn min_length(errors: &mut FieldErrors, name: &str, len: usize, min: usize) {
    if len < min {
        errors.push(FieldError::validation(
            name,
            format!("length must be at least {min} but got {len}"),
        ));
    }
}

pub fn max_length(errors: &mut FieldErrors, name: &str, len: usize, max: usize) {
    if len > max {
        errors.push(FieldError::validation(
            name,
            format!("length must be at most {max} but got {len}"),
        ));
    }
}

/// Values that have a distinguished zero.
pub trait Zero {
    fn is_zero(&self) -> bool;
}

impl Zero for i64 {
    fn is_zero(&self) -> bool {
        *self == 0
    }
}

impl Zero for f64 {
    fn is_zero(&self) -> bool {
        *self == 0.0
    }
}

impl Zero for bool {
    fn is_zero(&self) -> bool {
        !*self
    }
}

impl Zero for String {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl Zero for Value {
    fn is_zero(&self) -> bool {
        self.is_null()
    }
}

impl<T> Zero for Vec<T> {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Zero> Zero for Option<T> {
    fn is_zero(&self) -> bool {
        self.as_ref().is_none_or(Zero::is_zero)
    }
}

/// Checks that `value` is not its kind's zero value.
pub fn non_zero<T: Zero>(errors: &mut FieldErrors, name: &str, value: &T) {
    if value.is_zero() {
        errors.push(FieldError::validation(name, "must not be zero"));
    }
}

/// Checks that a required opaque value is present.
pub fn present(errors: &mut FieldErrors, name: &str, value: &Value) {
    if value.is_null() {
        errors.push(FieldError::missing_field(name, crate::Location::Payload));
    }
}
