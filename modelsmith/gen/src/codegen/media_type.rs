//! Media type rendering: structs plus view projections.
//!
//! A media type renders like a user type and additionally gets an
//! `IDENTIFIER` constant and a `dump` projection. When more than one view is
//! declared a `{Type}View` selector enum is emitted and both `dump` and
//! `project` take it; otherwise they take no selector. A media type without
//! views has an implicit `default` view holding every member.
//!
//! Collection media types (an array of a named media type) render as a
//! newtype over `Vec` that reuses the element's view selector.

use modelsmith_define::{MediaType, View};
use proc_macro2::TokenStream;
use quote::quote;

use super::coercion::TempVars;
use super::decode::decode_expr;
use super::types::{FieldPlan, ObjectRenderer, Shape, TypeScope, render_struct_definition, view_ident};
use crate::errors::GeneratorError;
use crate::naming::type_ident;

/// The views a media type projects through.
///
/// Collections use their element's views; a type without declared views
/// gets a `default` view over all members.
pub fn effective_views(media_type: &MediaType, scope: &TypeScope<'_>) -> Vec<View> {
    if let Some(element) = media_type.collection_of() {
        return match scope.media_type(element) {
            Some(element) => effective_views(element, scope),
            None => vec![View::new("default", Vec::<String>::new())],
        };
    }
    if media_type.views.is_empty() {
        let fields = media_type.attribute().fields().iter().map(|f| f.name.clone());
        vec![View::new("default", fields)]
    } else {
        media_type.views.clone()
    }
}

/// Name of the view used when a caller does not pick one.
pub fn default_view(views: &[View]) -> Option<&View> {
    views
        .iter()
        .find(|v| v.name == "default")
        .or_else(|| views.first())
}

/// Returns `true` when `dump`/`project` take a view selector.
pub fn takes_view(media_type: &MediaType, scope: &TypeScope<'_>) -> bool {
    effective_views(media_type, scope).len() > 1
}

/// The view selector type of a media type: its own enum, or its element's
/// enum for collections.
pub fn view_type(media_type: &MediaType, scope: &TypeScope<'_>) -> Result<TokenStream, GeneratorError> {
    match media_type.collection_of() {
        Some(element) => scope.resolve_view(element),
        None => scope.resolve_view(media_type.name()),
    }
}

/// Renders a version's `media_types.rs`.
pub fn render_media_types(scope: &TypeScope<'_>) -> Result<TokenStream, GeneratorError> {
    let mut renderer = ObjectRenderer::new(scope);
    let mut items = Vec::new();

    for media_type in &scope.version().media_types {
        let rendered = if media_type.collection_of().is_some() {
            render_collection(media_type, &mut renderer)?
        } else {
            render_media_type(media_type, &mut renderer)?
        };
        items.push(rendered);
        items.extend(renderer.take_nested());
    }

    Ok(quote! {
        //! Media types and their view projections.

        #(#items)*
    })
}

fn render_media_type(
    media_type: &MediaType,
    renderer: &mut ObjectRenderer<'_, '_>,
) -> Result<TokenStream, GeneratorError> {
    let name = media_type.name();
    let scope = renderer.scope();
    if !media_type.attribute().is_object() {
        return Err(GeneratorError::unsupported_shape(
            name,
            "media types must be objects or arrays of a named media type",
        ));
    }

    let plans = renderer.plan_fields(name, media_type.attribute())?;
    let definition = render_struct_definition(name, &media_type.user_type.description, &plans);
    let methods = renderer.render_methods(&plans)?;
    let views = effective_views(media_type, scope);
    let ty = type_ident(name);
    let identifier = media_type.identifier.as_str();

    let selector = if views.len() > 1 {
        Some(render_view_enum(name, &views))
    } else {
        None
    };
    let projection = render_projection(name, &views, &plans, scope, renderer.vars())?;
    let dump = if views.len() > 1 {
        let view_ty = view_ident(name);
        quote! {
            /// Validates, then renders the selected view.
            ///
            /// ## Errors
            ///
            /// Returns the validation errors; nothing is rendered.
            pub fn dump(&self, view: #view_ty) -> Result<serde_json::Value, modelsmith::FieldErrors> {
                self.validate()?;
                Ok(self.project(view))
            }
        }
    } else {
        quote! {
            /// Validates, then renders the value.
            ///
            /// ## Errors
            ///
            /// Returns the validation errors; nothing is rendered.
            pub fn dump(&self) -> Result<serde_json::Value, modelsmith::FieldErrors> {
                self.validate()?;
                Ok(self.project())
            }
        }
    };

    Ok(quote! {
        #definition

        #selector

        impl #ty {
            /// Content identifier sent with this type.
            pub const IDENTIFIER: &'static str = #identifier;

            #methods

            #dump

            #projection
        }
    })
}

fn render_view_enum(name: &str, views: &[View]) -> TokenStream {
    let enum_ident = view_ident(name);
    let doc = format!(" Views of [`{}`].", type_ident(name));
    let default_name = default_view(views).map(|v| v.name.as_str()).unwrap_or_default();
    let variants = views.iter().map(|view| {
        let variant = type_ident(&view.name);
        if view.name == default_name {
            quote!(#[default] #variant)
        } else {
            quote!(#variant)
        }
    });
    let names = views.iter().map(|view| {
        let variant = type_ident(&view.name);
        let view_name = view.name.as_str();
        quote!(Self::#variant => #view_name)
    });

    quote! {
        #[doc = #doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub enum #enum_ident {
            #(#variants),*
        }

        impl #enum_ident {
            /// The view name as declared.
            pub fn name(self) -> &'static str {
                match self {
                    #(#names),*
                }
            }
        }
    }
}

fn render_projection(
    name: &str,
    views: &[View],
    plans: &[FieldPlan<'_>],
    scope: &TypeScope<'_>,
    vars: &mut TempVars,
) -> Result<TokenStream, GeneratorError> {
    let mut arms = Vec::new();
    for view in views {
        let mut inserts = Vec::new();
        for field_name in &view.fields {
            let plan = plans.iter().find(|p| &p.field.name == field_name).ok_or_else(|| {
                GeneratorError::design(format!(
                    "view '{}' of '{}' names unknown member '{}'",
                    view.name, name, field_name
                ))
            })?;
            inserts.push(render_insert(plan, &view.name, scope, vars)?);
        }
        arms.push((view, inserts));
    }

    if views.len() > 1 {
        let view_ty = view_ident(name);
        let arms = arms.into_iter().map(|(view, inserts)| {
            let variant = type_ident(&view.name);
            quote! {
                #view_ty::#variant => {
                    #(#inserts)*
                }
            }
        });
        Ok(quote! {
            /// Renders the selected view without validating.
            pub fn project(&self, view: #view_ty) -> serde_json::Value {
                let mut out = serde_json::Map::new();
                match view {
                    #(#arms)*
                }
                serde_json::Value::Object(out)
            }
        })
    } else {
        let inserts = arms.into_iter().flat_map(|(_, inserts)| inserts);
        Ok(quote! {
            /// Renders the value without validating.
            #[allow(unused_mut)]
            pub fn project(&self) -> serde_json::Value {
                let mut out = serde_json::Map::new();
                #(#inserts)*
                serde_json::Value::Object(out)
            }
        })
    }
}

fn render_insert(
    plan: &FieldPlan<'_>,
    view_name: &str,
    scope: &TypeScope<'_>,
    vars: &mut TempVars,
) -> Result<TokenStream, GeneratorError> {
    let key = plan.field.name.as_str();
    let ident = &plan.ident;
    if plan.optional {
        let value = project_expr(&plan.shape, &quote!(value), view_name, scope, 0, vars)?;
        Ok(quote! {
            if let Some(value) = &self.#ident {
                out.insert(#key.to_string(), #value);
            }
        })
    } else {
        let value = project_expr(&plan.shape, &quote!(&self.#ident), view_name, scope, 0, vars)?;
        Ok(quote! {
            out.insert(#key.to_string(), #value);
        })
    }
}

fn contains_media(shape: &Shape, scope: &TypeScope<'_>) -> bool {
    match shape {
        Shape::Named { name, .. } => scope.media_type(name).is_some(),
        Shape::List(element) => contains_media(element, scope),
        _ => false,
    }
}

/// Renders an expression of type `serde_json::Value` for one member.
///
/// Nested media types render through their own projection, using the view
/// with the same name when they declare one and their default view
/// otherwise. Everything else is serialized as is.
fn project_expr(
    shape: &Shape,
    value: &TokenStream,
    view_name: &str,
    scope: &TypeScope<'_>,
    depth: usize,
    vars: &mut TempVars,
) -> Result<TokenStream, GeneratorError> {
    match shape {
        Shape::Named { name, .. } => match scope.media_type(name) {
            Some(nested) => {
                let views = effective_views(nested, scope);
                if views.len() > 1 {
                    let chosen = views
                        .iter()
                        .find(|v| v.name == view_name)
                        .or_else(|| default_view(&views))
                        .map(|v| type_ident(&v.name))
                        .ok_or_else(|| GeneratorError::design(format!("'{name}' has no views")))?;
                    let view_ty = view_type(nested, scope)?;
                    Ok(quote!((#value).project(#view_ty::#chosen)))
                } else {
                    Ok(quote!((#value).project()))
                }
            }
            None => Ok(quote!(modelsmith::render::to_value(#value))),
        },
        Shape::List(element) if contains_media(element, scope) => {
            let item = vars.fresh("item", depth);
            let inner = project_expr(element, &quote!(#item), view_name, scope, depth + 1, vars)?;
            Ok(quote! {
                serde_json::Value::Array((#value).iter().map(|#item| #inner).collect())
            })
        }
        _ => Ok(quote!(modelsmith::render::to_value(#value))),
    }
}

fn render_collection(
    media_type: &MediaType,
    renderer: &mut ObjectRenderer<'_, '_>,
) -> Result<TokenStream, GeneratorError> {
    let name = media_type.name();
    let scope = renderer.scope();
    let ty = type_ident(name);
    let identifier = media_type.identifier.as_str();
    let element_name = media_type.collection_of().unwrap_or_default();
    let element_path = scope.resolve(element_name)?;
    let doc = if media_type.user_type.description.is_empty() {
        format!(" A collection of `{element_name}`.")
    } else {
        format!(" {}", media_type.user_type.description)
    };

    let shape = Shape::List(Box::new(Shape::Named {
        name: element_name.to_string(),
        path: element_path.clone(),
    }));
    let decode = decode_expr(&shape, &quote!(raw), &quote!(context), 0, renderer.vars());

    let element_media = scope.media_type(element_name);
    let projection = match element_media {
        Some(element) if takes_view(element, scope) => {
            let view_ty = scope.resolve_view(element_name)?;
            quote! {
                /// Validates, then renders every element through the selected view.
                ///
                /// ## Errors
                ///
                /// Returns the validation errors; nothing is rendered.
                pub fn dump(&self, view: #view_ty) -> Result<serde_json::Value, modelsmith::FieldErrors> {
                    self.validate()?;
                    Ok(self.project(view))
                }

                /// Renders every element through the selected view without validating.
                pub fn project(&self, view: #view_ty) -> serde_json::Value {
                    serde_json::Value::Array(self.0.iter().map(|item| item.project(view)).collect())
                }
            }
        }
        Some(_) => quote! {
            /// Validates, then renders every element.
            ///
            /// ## Errors
            ///
            /// Returns the validation errors; nothing is rendered.
            pub fn dump(&self) -> Result<serde_json::Value, modelsmith::FieldErrors> {
                self.validate()?;
                Ok(self.project())
            }

            /// Renders every element without validating.
            pub fn project(&self) -> serde_json::Value {
                serde_json::Value::Array(self.0.iter().map(|item| item.project()).collect())
            }
        },
        None => quote! {
            /// Validates, then renders every element.
            ///
            /// ## Errors
            ///
            /// Returns the validation errors; nothing is rendered.
            pub fn dump(&self) -> Result<serde_json::Value, modelsmith::FieldErrors> {
                self.validate()?;
                Ok(self.project())
            }

            /// Renders every element without validating.
            pub fn project(&self) -> serde_json::Value {
                modelsmith::render::to_value(&self.0)
            }
        },
    };

    Ok(quote! {
        #[doc = #doc]
        #[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct #ty(pub Vec<#element_path>);

        impl #ty {
            /// Content identifier sent with this type.
            pub const IDENTIFIER: &'static str = #identifier;

            /// Decodes a JSON array, recording mismatches under `context`.
            pub fn decode(
                raw: &serde_json::Value,
                context: &str,
                errors: &mut modelsmith::FieldErrors,
            ) -> Self {
                Self(#decode.unwrap_or_default())
            }

            /// Decodes and validates a JSON array.
            ///
            /// ## Errors
            ///
            /// Returns every decode error, or failing that every validation error.
            pub fn load(raw: &serde_json::Value) -> Result<Self, modelsmith::FieldErrors> {
                let mut errors = modelsmith::FieldErrors::new();
                let decoded = Self::decode(raw, "", &mut errors);
                errors.into_result()?;
                decoded.validate()?;
                Ok(decoded)
            }

            /// Checks the declared rules of every element.
            ///
            /// ## Errors
            ///
            /// Returns every failed rule.
            pub fn validate(&self) -> Result<(), modelsmith::FieldErrors> {
                let mut errors = modelsmith::FieldErrors::new();
                self.collect_errors("", &mut errors);
                errors.into_result()
            }

            /// Appends the failed rules of every element to `errors`.
            pub fn collect_errors(&self, context: &str, errors: &mut modelsmith::FieldErrors) {
                for (index, item) in self.0.iter().enumerate() {
                    item.collect_errors(&modelsmith::decode::index(context, index), errors);
                }
            }

            #projection
        }
    })
}
