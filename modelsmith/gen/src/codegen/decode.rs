//! The object decode path.
//!
//! Payloads and media types arrive as JSON. Unlike raw parameters they are
//! decoded member by member: every member is looked up, converted by kind
//! and assigned, and each mismatch or missing required member is recorded
//! under its dotted path. Decoding never stops early; the caller decides
//! whether the collected errors are fatal.

use proc_macro2::TokenStream;
use quote::quote;

use super::coercion::TempVars;
use super::types::{FieldPlan, Shape};

/// Renders an expression of type `Option<T>` decoding `value`.
///
/// ## Arguments
///
/// * `shape` - The member's shape
/// * `value` - Expression of type `&serde_json::Value`
/// * `path` - Expression of type `&str` locating the value in errors
/// * `depth` - Array nesting depth, used to suffix closure bindings
/// * `vars` - Temporary identifier source for the artifact
///
/// The expression expects an `errors: &mut FieldErrors` binding in scope.
pub fn decode_expr(
    shape: &Shape,
    value: &TokenStream,
    path: &TokenStream,
    depth: usize,
    vars: &mut TempVars,
) -> TokenStream {
    match shape {
        Shape::Boolean => quote!(modelsmith::decode::boolean(#value, #path, errors)),
        Shape::Integer => quote!(modelsmith::decode::integer(#value, #path, errors)),
        Shape::Number => quote!(modelsmith::decode::number(#value, #path, errors)),
        Shape::String => quote!(modelsmith::decode::string(#value, #path, errors)),
        Shape::Any => quote!(modelsmith::decode::any(#value, #path, errors)),
        Shape::Named { path: ty, .. } => quote!(Some(#ty::decode(#value, #path, errors))),
        Shape::List(element) => {
            let items = vars.fresh("items", depth);
            let index = vars.fresh("index", depth);
            let item = vars.fresh("item", depth);
            let item_path = vars.fresh("path", depth);
            let inner = decode_expr(
                element,
                &quote!(#item),
                &quote!(&#item_path),
                depth + 1,
                vars,
            );
            quote! {
                modelsmith::decode::array(#value, #path, errors).map(|#items| {
                    #items
                        .iter()
                        .enumerate()
                        .filter_map(|(#index, #item)| {
                            let #item_path = modelsmith::decode::index(#path, #index);
                            #inner
                        })
                        .collect::<Vec<_>>()
                })
            }
        }
    }
}

/// Renders the `decode` associated function of a generated struct.
pub fn render_decode_fn(plans: &[FieldPlan<'_>], vars: &mut TempVars) -> TokenStream {
    if plans.is_empty() {
        return quote! {
            /// Decodes a JSON object, recording mismatches under `context`.
            pub fn decode(
                raw: &serde_json::Value,
                context: &str,
                errors: &mut modelsmith::FieldErrors,
            ) -> Self {
                modelsmith::decode::object(raw, context, errors);
                Self::default()
            }
        };
    }

    let members = plans.iter().map(|plan| render_member(plan, vars));
    quote! {
        /// Decodes a JSON object, recording mismatches under `context`.
        ///
        /// Members that fail to decode keep their default value.
        pub fn decode(
            raw: &serde_json::Value,
            context: &str,
            errors: &mut modelsmith::FieldErrors,
        ) -> Self {
            let mut decoded = Self::default();
            let Some(object) = modelsmith::decode::object(raw, context, errors) else {
                return decoded;
            };
            #(#members)*
            decoded
        }
    }
}

fn render_member(plan: &FieldPlan<'_>, vars: &mut TempVars) -> TokenStream {
    let name = plan.field.name.as_str();
    let ident = &plan.ident;
    let expr = decode_expr(&plan.shape, &quote!(value), &quote!(&path), 0, vars);
    let assigned = if plan.optional {
        quote!(Some(member))
    } else {
        quote!(member)
    };
    let present = quote! {
        let path = modelsmith::decode::path(context, #name);
        if let Some(member) = #expr {
            decoded.#ident = #assigned;
        }
    };

    if plan.required {
        quote! {
            match modelsmith::decode::member(object, #name) {
                Some(value) => {
                    #present
                }
                None => errors.push(modelsmith::FieldError::missing_field(
                    modelsmith::decode::path(context, #name),
                    modelsmith::Location::Payload,
                )),
            }
        }
    } else {
        quote! {
            if let Some(value) = modelsmith::decode::member(object, #name) {
                #present
            }
        }
    }
}
