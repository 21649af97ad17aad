//! Response senders rendered onto each action context.
//!
//! One method per declared response, named after the response. Three body
//! shapes are supported:
//!
//! - a known media type: the value is validated, projected and sent as JSON
//! - any other content identifier: raw bytes are passed through
//! - no identifier: an empty body

use modelsmith_define::{Action, Resource, Response};
use proc_macro2::TokenStream;
use quote::quote;

use super::media_type::{takes_view, view_type};
use super::types::TypeScope;
use crate::errors::GeneratorError;
use crate::naming::{ident, type_ident};

/// Merges resource and action responses.
///
/// Action responses come first in declaration order; resource responses
/// follow unless an action response has the same name. A nameless `OK`
/// response inherits the resource's default media type.
pub fn merged_responses(resource: &Resource, action: &Action) -> Vec<Response> {
    let inherited = resource
        .responses
        .iter()
        .filter(|r| !action.responses.iter().any(|a| a.name == r.name));

    action
        .responses
        .iter()
        .chain(inherited)
        .map(|response| {
            let mut response = response.clone();
            if response.media_type.is_none() && response.name == "OK" && response.status == 200 {
                response.media_type = resource.media_type.clone();
            }
            response
        })
        .collect()
}

/// Renders the sender methods of one action.
///
/// ## Errors
///
/// Returns `MissingDesignInput` when a referenced media type cannot be
/// resolved from the version.
pub fn render_responses(
    resource: &Resource,
    action: &Action,
    scope: &TypeScope<'_>,
) -> Result<TokenStream, GeneratorError> {
    let senders = merged_responses(resource, action)
        .iter()
        .map(|response| render_response(response, scope))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(quote!(#(#senders)*))
}

fn render_response(response: &Response, scope: &TypeScope<'_>) -> Result<TokenStream, GeneratorError> {
    let method = ident(&response.name);
    let status = response.status;
    let Some(identifier) = response.media_type.as_deref() else {
        let doc = format!(" Sends `{}` ({status}) with an empty body.", response.name);
        return Ok(quote! {
            #[doc = #doc]
            pub fn #method(&mut self) -> Result<(), modelsmith::ResponseError> {
                self.request.respond(#status, Vec::new())
            }
        });
    };

    let Some(media_type) = scope.media_type_by_identifier(identifier) else {
        let doc = format!(" Sends `{}` ({status}) with a raw `{identifier}` body.", response.name);
        return Ok(quote! {
            #[doc = #doc]
            pub fn #method(&mut self, body: Vec<u8>) -> Result<(), modelsmith::ResponseError> {
                self.request.set_header("Content-Type", #identifier);
                self.request.respond(#status, body)
            }
        });
    };

    let value_ty = scope.resolve(media_type.name())?;
    let content_type = format!("{identifier}; charset=utf-8");
    let doc = format!(
        " Validates and sends `{}` ({status}) as `{}`.",
        response.name,
        type_ident(media_type.name())
    );
    let errors_doc = quote! {
        ///
        /// ## Errors
        ///
        /// Returns `ResponseError::Invalid` when the value fails validation;
        /// nothing is sent in that case.
    };

    if takes_view(media_type, scope) {
        let view_ty = view_type(media_type, scope)?;
        Ok(quote! {
            #[doc = #doc]
            #errors_doc
            pub fn #method(
                &mut self,
                value: &#value_ty,
                view: #view_ty,
            ) -> Result<(), modelsmith::ResponseError> {
                let body = serde_json::to_vec(&value.dump(view)?)?;
                self.request.set_header("Content-Type", #content_type);
                self.request.respond(#status, body)
            }
        })
    } else {
        Ok(quote! {
            #[doc = #doc]
            #errors_doc
            pub fn #method(&mut self, value: &#value_ty) -> Result<(), modelsmith::ResponseError> {
                let body = serde_json::to_vec(&value.dump()?)?;
                self.request.set_header("Content-Type", #content_type);
                self.request.respond(#status, body)
            }
        })
    }
}
