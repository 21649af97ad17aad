//! Validation checks emitted after a value has been produced.
//!
//! Each declared value-level rule becomes one call into
//! `modelsmith::validate`. The same rules can be run at generation time with
//! [`execute_value_checks`], which is what the context plan uses.

use modelsmith::FieldErrors;
use modelsmith::validate;
use modelsmith_define::{Attribute, AttributeType, Validation};
use proc_macro2::{Literal, TokenStream};
use quote::quote;
use serde_json::Value;

use crate::errors::GeneratorError;

/// Expressions a rendered check operates on.
pub struct CheckTarget {
    /// Expression of type `&str` naming the value in errors.
    pub name: TokenStream,
    /// Expression of type `&T` for the checked value.
    pub value: TokenStream,
    /// Expression of type `&mut FieldErrors`.
    pub errors: TokenStream,
}

/// Renders the value-level rules declared on `attribute`.
///
/// Rules that do not apply to the attribute's kind (a pattern on an integer,
/// a length on a boolean) are skipped.
///
/// ## Errors
///
/// Returns `GeneratorError::CodeGenError` for non-finite range bounds.
pub fn render_value_checks(
    attribute: &Attribute,
    target: &CheckTarget,
) -> Result<TokenStream, GeneratorError> {
    let CheckTarget {
        name,
        value,
        errors,
    } = target;
    let mut checks = Vec::new();

    for rule in attribute.value_validations() {
        match (rule, &attribute.kind) {
            (Validation::Pattern(pattern), AttributeType::String) => checks.push(quote! {
                modelsmith::validate::pattern(#errors, #name, #value, #pattern);
            }),
            (Validation::Enum(values), _) => {
                let allowed = values.iter().map(json_literal);
                checks.push(quote! {
                    modelsmith::validate::one_of(
                        #errors,
                        #name,
                        &modelsmith::render::to_value(#value),
                        &[#(#allowed),*],
                    );
                });
            }
            (Validation::Minimum(bound), kind @ (AttributeType::Integer | AttributeType::Number)) => {
                let bound = float_literal(*bound)?;
                let number = numeric(kind, value);
                checks.push(quote! {
                    modelsmith::validate::minimum(#errors, #name, #number, #bound);
                });
            }
            (Validation::Maximum(bound), kind @ (AttributeType::Integer | AttributeType::Number)) => {
                let bound = float_literal(*bound)?;
                let number = numeric(kind, value);
                checks.push(quote! {
                    modelsmith::validate::maximum(#errors, #name, #number, #bound);
                });
            }
            (Validation::MinLength(len), kind @ (AttributeType::String | AttributeType::Array { .. })) => {
                let len = Literal::usize_unsuffixed(*len);
                let measured = length(kind, value);
                checks.push(quote! {
                    modelsmith::validate::min_length(#errors, #name, #measured, #len);
                });
            }
            (Validation::MaxLength(len), kind @ (AttributeType::String | AttributeType::Array { .. })) => {
                let len = Literal::usize_unsuffixed(*len);
                let measured = length(kind, value);
                checks.push(quote! {
                    modelsmith::validate::max_length(#errors, #name, #measured, #len);
                });
            }
            _ => {}
        }
    }

    Ok(quote!(#(#checks)*))
}

/// Renders a non-zero check; the value must implement `modelsmith::validate::Zero`.
pub fn render_non_zero(target: &CheckTarget) -> TokenStream {
    let CheckTarget {
        name,
        value,
        errors,
    } = target;
    quote! {
        modelsmith::validate::non_zero(#errors, #name, #value);
    }
}

/// Renders a presence check for a required opaque value.
pub fn render_present(target: &CheckTarget) -> TokenStream {
    let CheckTarget {
        name,
        value,
        errors,
    } = target;
    quote! {
        modelsmith::validate::present(#errors, #name, #value);
    }
}

/// Runs the value-level rules of `attribute` against a JSON value.
pub fn execute_value_checks(
    name: &str,
    attribute: &Attribute,
    value: &Value,
    errors: &mut FieldErrors,
) {
    for rule in attribute.value_validations() {
        match rule {
            Validation::Pattern(pattern) => {
                if let Value::String(text) = value {
                    validate::pattern(errors, name, text, pattern);
                }
            }
            Validation::Enum(allowed) => validate::one_of(errors, name, value, allowed),
            Validation::Minimum(bound) => {
                if let Some(n) = value.as_f64() {
                    validate::minimum(errors, name, n, *bound);
                }
            }
            Validation::Maximum(bound) => {
                if let Some(n) = value.as_f64() {
                    validate::maximum(errors, name, n, *bound);
                }
            }
            Validation::MinLength(len) => {
                if let Some(measured) = json_length(value) {
                    validate::min_length(errors, name, measured, *len);
                }
            }
            Validation::MaxLength(len) => {
                if let Some(measured) = json_length(value) {
                    validate::max_length(errors, name, measured, *len);
                }
            }
            Validation::Required(_) | Validation::NonZero(_) => {}
        }
    }
}

fn json_length(value: &Value) -> Option<usize> {
    match value {
        Value::String(text) => Some(text.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

fn numeric(kind: &AttributeType, value: &TokenStream) -> TokenStream {
    match kind {
        AttributeType::Integer => quote!(*(#value) as f64),
        _ => quote!(*(#value)),
    }
}

fn length(kind: &AttributeType, value: &TokenStream) -> TokenStream {
    match kind {
        AttributeType::String => quote!((#value).chars().count()),
        _ => quote!((#value).len()),
    }
}

fn float_literal(bound: f64) -> Result<Literal, GeneratorError> {
    if bound.is_finite() {
        Ok(Literal::f64_suffixed(bound))
    } else {
        Err(GeneratorError::CodeGenError(format!(
            "range bound {bound} is not a finite number"
        )))
    }
}

/// Renders a JSON value as a `serde_json::Value` constructor expression.
pub fn json_literal(value: &Value) -> TokenStream {
    match value {
        Value::Null => quote!(serde_json::Value::Null),
        Value::Bool(b) => quote!(serde_json::Value::Bool(#b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                quote!(serde_json::Value::from(#i))
            } else if let Some(u) = n.as_u64() {
                quote!(serde_json::Value::from(#u))
            } else {
                let f = Literal::f64_suffixed(n.as_f64().unwrap_or_default());
                quote!(serde_json::Value::from(#f))
            }
        }
        Value::String(s) => quote!(serde_json::Value::from(#s)),
        Value::Array(items) => {
            let items = items.iter().map(json_literal);
            quote!(serde_json::Value::Array(vec![#(#items),*]))
        }
        Value::Object(map) => {
            let entries = map.iter().map(|(k, v)| {
                let v = json_literal(v);
                quote!((#k.to_string(), #v))
            });
            quote!(serde_json::Value::Object(serde_json::Map::from_iter([#(#entries),*])))
        }
    }
}
