//! Href factories, one per resource with a canonical action.
//!
//! The href of a resource is the first route of its canonical action joined
//! onto the resource base path. Every path parameter becomes an argument in
//! template order:
//!
//! ```text
//! /accounts/:accountID/bottles/:bottleID
//!   -> pub fn bottle_href(account_id: impl Display, bottle_id: impl Display) -> String
//! ```

use modelsmith_define::{ApiVersion, Resource};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use tracing::debug;

use crate::errors::GeneratorError;
use crate::naming::{ident, snake_case};
use crate::parser::{format_template, join_path};

/// The href template of a resource, when it has a canonical action with at
/// least one route.
pub fn href_template(resource: &Resource) -> Option<String> {
    let canonical = resource.canonical_action.as_deref()?;
    let route = resource.find_action(canonical)?.routes.first()?;
    Some(join_path(&resource.base_path, &route.path))
}

/// Renders the hrefs artifact of a version.
///
/// ## Errors
///
/// Returns `MissingDesignInput` when a canonical action is named but not
/// declared on its resource.
pub fn render_hrefs(version: &ApiVersion) -> Result<TokenStream, GeneratorError> {
    let mut factories = Vec::new();
    for resource in &version.resources {
        if let Some(canonical) = resource.canonical_action.as_deref()
            && resource.find_action(canonical).is_none()
        {
            return Err(GeneratorError::design(format!(
                "resource '{}' names canonical action '{canonical}', which it does not declare",
                resource.name
            )));
        }
        let Some(template) = href_template(resource) else {
            debug!(resource = %resource.name, "no canonical route, skipping href");
            continue;
        };
        factories.push(render_href(&resource.name, &template));
    }

    Ok(quote! {
        //! Href factories for resources with a canonical action.

        #(#factories)*
    })
}

fn render_href(resource: &str, template: &str) -> TokenStream {
    let name = format_ident!("{}_href", snake_case(resource));
    let doc = format!(" Builds `{template}`.");
    let (fmt, params) = format_template(template);
    if params.is_empty() {
        return quote! {
            #[doc = #doc]
            pub fn #name() -> String {
                #fmt.to_string()
            }
        };
    }
    let args: Vec<_> = params.iter().map(|p| ident(p)).collect();
    quote! {
        #[doc = #doc]
        pub fn #name(#(#args: impl std::fmt::Display),*) -> String {
            format!(#fmt, #(#args),*)
        }
    }
}
