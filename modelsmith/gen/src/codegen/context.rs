//! Per-action request context synthesis.
//!
//! Each action gets a `{Action}{Resource}Context` struct holding its coerced
//! parameters, its decoded payload and the request it was built from. The
//! constructor works in three passes:
//!
//! 1. required headers of the merged resource and action header sets are
//!    checked for presence
//! 2. every parameter is read as raw text, coerced and validated; failures
//!    are collected and construction continues
//! 3. the payload, when declared, is decoded and validated; a failure here
//!    aborts construction
//!
//! [`ContextPlan`] runs the same passes against a request at generation
//! time, which makes the rendered constructor's behavior testable without
//! compiling it.

use modelsmith::validate;
use modelsmith::{FieldError, FieldErrors, Location, RequestAccessor};
use modelsmith_define::{Action, Attribute, Field, Resource, UserType, Validation};
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};
use serde_json::{Map, Value};

use super::checks::{CheckTarget, execute_value_checks, render_non_zero, render_value_checks};
use super::coercion::{Coercion, TempVars, raw_ident};
use super::response::render_responses;
use super::types::TypeScope;
use crate::errors::GeneratorError;
use crate::naming::{ident, type_ident, upper_camel};
use crate::parser::{is_path_param, join_path};

/// Member names the context struct reserves for itself.
const RESERVED_MEMBERS: &[&str] = &["request", "payload"];

/// Name of the context struct generated for an action.
///
/// ## Examples
///
/// ```
/// use modelsmith_gen::codegen::context::context_name;
///
/// assert_eq!(context_name("bottle", "show"), "ShowBottleContext");
/// ```
pub fn context_name(resource: &str, action: &str) -> String {
    format!("{}{}Context", upper_camel(action), upper_camel(resource))
}

/// Full route paths of an action: the resource base path joined with each
/// route path.
pub fn full_paths(resource: &Resource, action: &Action) -> Vec<String> {
    action
        .routes
        .iter()
        .map(|route| join_path(&resource.base_path, &route.path))
        .collect()
}

/// Merges resource and action headers: resource members first, action
/// members override by name, required sets are united.
pub fn merged_headers(resource: &Resource, action: &Action) -> Option<Attribute> {
    let (resource_headers, action_headers) = match (&resource.headers, &action.headers) {
        (None, None) => return None,
        (Some(headers), None) | (None, Some(headers)) => return Some(headers.clone()),
        (Some(r), Some(a)) => (r, a),
    };

    let mut fields: Vec<Field> = resource_headers
        .fields()
        .iter()
        .filter(|f| action_headers.field(&f.name).is_none())
        .cloned()
        .collect();
    fields.extend(action_headers.fields().iter().cloned());

    let required: Vec<String> = fields
        .iter()
        .filter(|f| resource_headers.is_required(&f.name) || action_headers.is_required(&f.name))
        .map(|f| f.name.clone())
        .collect();

    let mut merged = Attribute::object(fields);
    if !required.is_empty() {
        merged = merged.with_validation(Validation::Required(required));
    }
    Some(merged)
}

/// How one parameter is read, coerced and checked.
#[derive(Debug, Clone)]
pub struct ParamPlan<'a> {
    pub name: &'a str,
    pub attribute: &'a Attribute,
    pub coercion: Coercion,
    /// Appears in every route template; never presence-checked.
    pub path: bool,
    pub required: bool,
    pub pointer: bool,
    pub non_zero: bool,
}

/// Everything needed to build one action's context.
#[derive(Debug, Clone)]
pub struct ContextPlan<'a> {
    pub resource: &'a Resource,
    pub action: &'a Action,
    pub params: Vec<ParamPlan<'a>>,
    /// Header names that must be present and non-empty.
    pub required_headers: Vec<String>,
    pub payload: Option<&'a UserType>,
}

/// Result of running a [`ContextPlan`]: the coerced parameter values and the
/// errors collected on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanOutcome {
    pub values: Map<String, Value>,
    pub errors: FieldErrors,
}

impl<'a> ContextPlan<'a> {
    /// Plans the context of `action`.
    ///
    /// ## Errors
    ///
    /// Returns `UnsupportedCompositeShape` for parameters with no text form,
    /// and `MissingDesignInput` when a parameter name collides with a
    /// reserved context member.
    pub fn build(resource: &'a Resource, action: &'a Action) -> Result<Self, GeneratorError> {
        let paths = full_paths(resource, action);
        let mut params = Vec::new();
        if let Some(attribute) = &action.params {
            for field in attribute.fields() {
                let member = ident(&field.name).to_string();
                if RESERVED_MEMBERS.contains(&member.as_str()) {
                    return Err(GeneratorError::design(format!(
                        "parameter '{}' of action '{}' collides with a context member",
                        field.name, action.name
                    )));
                }
                params.push(ParamPlan {
                    name: &field.name,
                    attribute: &field.attribute,
                    coercion: Coercion::compile(&field.name, &field.attribute)?,
                    path: is_path_param(&paths, &field.name),
                    required: attribute.is_required(&field.name),
                    pointer: attribute.is_pointer(&field.name),
                    non_zero: attribute.is_non_zero(&field.name),
                });
            }
        }

        let required_headers = merged_headers(resource, action)
            .map(|headers| {
                headers
                    .fields()
                    .iter()
                    .filter(|f| headers.is_required(&f.name))
                    .map(|f| f.name.clone())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            resource,
            action,
            params,
            required_headers,
            payload: action.payload.as_ref(),
        })
    }

    /// Runs the header and parameter passes against a request.
    ///
    /// ## Errors
    ///
    /// Returns the payload failure when a payload is declared but absent;
    /// parameter and header errors are collected into the outcome instead.
    pub fn execute(&self, request: &dyn RequestAccessor) -> Result<PlanOutcome, FieldErrors> {
        let mut outcome = PlanOutcome::default();

        for header in &self.required_headers {
            if request.header(header).unwrap_or_default().is_empty() {
                outcome.errors.push(FieldError::missing_header(header.as_str()));
            }
        }

        for param in &self.params {
            let raw = request.param(param.name).unwrap_or_default();
            if raw.is_empty() {
                if param.required && !param.path {
                    outcome.errors.push(FieldError::missing_param(param.name));
                }
                continue;
            }
            match param.coercion.execute(param.name, raw) {
                Ok(value) => {
                    execute_param_checks(param, &value, &mut outcome.errors);
                    outcome.values.insert(param.name.to_string(), value);
                }
                Err(error) => outcome.errors.push(error),
            }
        }

        if self.payload.is_some() && request.payload().is_none() {
            return Err(FieldError::missing_field("payload", Location::Payload).into());
        }
        Ok(outcome)
    }
}

fn execute_param_checks(param: &ParamPlan<'_>, value: &Value, errors: &mut FieldErrors) {
    execute_value_checks(param.name, param.attribute, value, errors);
    if let (Some(element), Value::Array(items)) = (param.attribute.element(), value) {
        for item in items {
            execute_value_checks(param.name, element, item, errors);
        }
    }
    if param.non_zero {
        match value {
            Value::Number(n) => validate::non_zero(errors, param.name, &n.as_f64().unwrap_or_default()),
            Value::Bool(b) => validate::non_zero(errors, param.name, b),
            Value::String(s) => validate::non_zero(errors, param.name, s),
            Value::Array(items) => validate::non_zero(errors, param.name, items),
            other => validate::non_zero(errors, param.name, other),
        }
    }
}

/// Renders a version's `contexts.rs`: one context per action, each with its
/// response senders.
pub fn render_contexts(scope: &TypeScope<'_>) -> Result<TokenStream, GeneratorError> {
    let mut vars = TempVars::new();
    let mut items = Vec::new();
    for resource in &scope.version().resources {
        for action in &resource.actions {
            let plan = ContextPlan::build(resource, action)?;
            items.push(render_context(&plan, scope, &mut vars)?);
        }
    }

    Ok(quote! {
        //! Request contexts, one per action.

        #(#items)*
    })
}

/// Renders one context struct, its constructor, its response senders and
/// its `RequestAccessor` forwarding.
pub fn render_context(
    plan: &ContextPlan<'_>,
    scope: &TypeScope<'_>,
    vars: &mut TempVars,
) -> Result<TokenStream, GeneratorError> {
    let name = context_name(&plan.resource.name, &plan.action.name);
    let ty = type_ident(&name);
    let doc = if plan.action.description.is_empty() {
        format!(" Context of the `{}` action of `{}`.", plan.action.name, plan.resource.name)
    } else {
        format!(" {}", plan.action.description)
    };

    let mut fields = Vec::new();
    let mut locals = Vec::new();
    let mut params = Vec::new();
    let mut members = Vec::new();
    for param in &plan.params {
        let member = ident(param.name);
        let ty = param.coercion.rust_type();
        let ty = if param.pointer { quote!(Option<#ty>) } else { ty };
        if let Some(description) = &param.attribute.description {
            let description = format!(" {description}");
            fields.push(quote!(#[doc = #description] pub #member: #ty));
        } else {
            fields.push(quote!(pub #member: #ty));
        }
        locals.push(quote!(let mut #member: #ty = Default::default();));
        params.push(render_param(param, &member, vars)?);
        members.push(quote!(#member));
    }

    let payload = match plan.payload {
        Some(payload) => {
            let payload_ty = scope.resolve(&payload.name)?;
            fields.push(quote!(pub payload: #payload_ty));
            members.push(quote!(payload));
            Some(quote! {
                let payload = match request.payload() {
                    Some(raw) => #payload_ty::load(raw).map_err(modelsmith::ContextError::Payload)?,
                    None => {
                        return Err(modelsmith::ContextError::Payload(
                            modelsmith::FieldError::missing_field("payload", modelsmith::Location::Payload)
                                .into(),
                        ));
                    }
                };
            })
        }
        None => None,
    };

    let headers = plan.required_headers.iter().map(|header| {
        quote! {
            if request.header(#header).unwrap_or_default().is_empty() {
                errors.push(modelsmith::FieldError::missing_header(#header));
            }
        }
    });
    let responses = render_responses(plan.resource, plan.action, scope)?;
    let errors_binding = if params.is_empty() && plan.required_headers.is_empty() {
        quote!(let errors = modelsmith::FieldErrors::new();)
    } else {
        quote! {
            #[allow(unused_mut)]
            let mut errors = modelsmith::FieldErrors::new();
        }
    };

    Ok(quote! {
        #[doc = #doc]
        #[derive(Debug)]
        pub struct #ty {
            request: Box<dyn modelsmith::RequestAccessor>,
            #(#fields,)*
        }

        impl #ty {
            /// Builds the context from a raw request.
            ///
            /// ## Errors
            ///
            /// Returns `ContextError::Payload` as soon as the payload fails to
            /// decode or validate. Header and parameter errors are collected
            /// and returned as `ContextError::Invalid` together with the
            /// partially built context.
            pub fn new(
                request: Box<dyn modelsmith::RequestAccessor>,
            ) -> Result<Self, modelsmith::ContextError<Self>> {
                #errors_binding
                #(#headers)*
                #(#locals)*
                #(#params)*
                #payload
                let context = Self {
                    request,
                    #(#members,)*
                };
                match errors.into_result() {
                    Ok(()) => Ok(context),
                    Err(errors) => Err(modelsmith::ContextError::Invalid {
                        context: Box::new(context),
                        errors,
                    }),
                }
            }

            /// The request this context was built from.
            pub fn request(&self) -> &dyn modelsmith::RequestAccessor {
                self.request.as_ref()
            }

            #responses
        }

        impl modelsmith::RequestAccessor for #ty {
            fn param(&self, name: &str) -> Option<&str> {
                self.request.param(name)
            }

            fn header(&self, name: &str) -> Option<&str> {
                self.request.header(name)
            }

            fn payload(&self) -> Option<&serde_json::Value> {
                self.request.payload()
            }

            fn set_header(&mut self, name: &str, value: &str) {
                self.request.set_header(name, value);
            }

            fn respond(&mut self, status: u16, body: Vec<u8>) -> Result<(), modelsmith::ResponseError> {
                self.request.respond(status, body)
            }

            fn sent(&self) -> Option<&modelsmith::SentResponse> {
                self.request.sent()
            }
        }
    })
}

fn render_param(
    param: &ParamPlan<'_>,
    member: &Ident,
    vars: &mut TempVars,
) -> Result<TokenStream, GeneratorError> {
    let name = param.name;
    let raw = raw_ident(name);

    // Bounds that cannot be rendered fail here rather than inside the closure.
    render_value_checks(param.attribute, &target(name, quote!(value)))?;
    if let Some(element) = param.attribute.element() {
        render_value_checks(element, &target(name, quote!(item)))?;
    }

    let coerced = param.coercion.render(
        name,
        &quote!(#raw),
        &quote!(#member),
        param.pointer,
        0,
        vars,
        &|value| param_checks(param, value),
    );

    let body = if param.required && !param.path {
        quote! {
            if #raw.is_empty() {
                errors.push(modelsmith::FieldError::missing_param(#name));
            } else {
                #coerced
            }
        }
    } else {
        quote! {
            if !#raw.is_empty() {
                #coerced
            }
        }
    };

    Ok(quote! {
        {
            let #raw = request.param(#name).unwrap_or_default();
            #body
        }
    })
}

/// Renders a parameter's checks against the coerced value binding.
fn param_checks(param: &ParamPlan<'_>, value: &Ident) -> TokenStream {
    let name = param.name;
    let own = render_value_checks(param.attribute, &target(name, quote!(&#value)))
        .unwrap_or_default();
    let elements = param
        .attribute
        .element()
        .and_then(|element| {
            let item = format_ident!("{}_item", value);
            let checks = render_value_checks(element, &target(name, quote!(#item))).ok()?;
            (!checks.is_empty()).then(|| {
                quote! {
                    for #item in #value.iter() {
                        #checks
                    }
                }
            })
        })
        .unwrap_or_default();
    let zero = if param.non_zero {
        render_non_zero(&target(name, quote!(&#value)))
    } else {
        TokenStream::new()
    };
    quote! {
        #own
        #elements
        #zero
    }
}

fn target(name: &str, value: TokenStream) -> CheckTarget {
    CheckTarget {
        name: quote!(#name),
        value,
        errors: quote!(&mut errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelsmith::MemoryRequest;
    use modelsmith_define::{ApiVersion, RestMethod};
    use serde_json::json;

    fn bottles() -> Resource {
        Resource::new("bottle")
            .with_base_path("/accounts/:accountID/bottles")
            .with_headers(
                Attribute::object(vec![Field::new("X-Account", Attribute::string())])
                    .required(["X-Account"]),
            )
            .action(
                Action::new("list")
                    .route(RestMethod::Get, "")
                    .with_params(
                        Attribute::object(vec![
                            Field::new("accountID", Attribute::integer()),
                            Field::new("count", Attribute::integer().minimum(1.0)),
                            Field::new("years", Attribute::array(Attribute::integer())),
                            Field::new("sort", Attribute::string().one_of(vec![json!("name"), json!("vintage")])),
                        ])
                        .required(["accountID", "count"]),
                    ),
            )
            .action(
                Action::new("create")
                    .route(RestMethod::Post, "")
                    .with_payload(UserType::new(
                        "CreateBottlePayload",
                        Attribute::object(vec![Field::new("name", Attribute::string())])
                            .required(["name"]),
                    )),
            )
    }

    fn plan<'a>(resource: &'a Resource, action: &str) -> ContextPlan<'a> {
        let action = resource.find_action(action).unwrap();
        ContextPlan::build(resource, action).unwrap()
    }

    // === plan tests ===

    #[test]
    fn scenario_a_integer_parameter() {
        let resource = bottles();
        let plan = plan(&resource, "list");
        let request = MemoryRequest::new()
            .with_header("X-Account", "1")
            .with_param("count", "42");
        let outcome = plan.execute(&request).unwrap();
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.values["count"], json!(42));

        let request = MemoryRequest::new()
            .with_header("X-Account", "1")
            .with_param("count", "abc");
        let outcome = plan.execute(&request).unwrap();
        assert_eq!(
            outcome.errors.first(),
            Some(&FieldError::invalid_type("count", "abc", "integer"))
        );
        assert!(!outcome.values.contains_key("count"));
    }

    #[test]
    fn path_parameters_are_never_missing() {
        let resource = bottles();
        let plan = plan(&resource, "list");
        assert!(plan.params[0].path);
        assert!(!plan.params[1].path);

        let outcome = plan.execute(&MemoryRequest::new()).unwrap();
        let missing: Vec<_> = outcome.errors.iter().map(FieldError::name).collect();
        assert_eq!(missing, vec!["X-Account", "count"]);
    }

    #[test]
    fn errors_accumulate_across_parameters() {
        let resource = bottles();
        let plan = plan(&resource, "list");
        let request = MemoryRequest::new()
            .with_header("X-Account", "1")
            .with_param("count", "0")
            .with_param("years", "2001,x")
            .with_param("sort", "price");
        let outcome = plan.execute(&request).unwrap();
        assert_eq!(outcome.errors.len(), 3);
        assert!(outcome.errors.iter().any(|e| *e == FieldError::invalid_type("years", "x", "integer")));
    }

    #[test]
    fn missing_payload_fails_fast() {
        let resource = bottles();
        let plan = plan(&resource, "create");
        let err = plan.execute(&MemoryRequest::new()).unwrap_err();
        assert!(err.first().is_some_and(FieldError::is_missing));

        let request = MemoryRequest::new()
            .with_header("X-Account", "1")
            .with_payload(json!({"name": "Merlot"}));
        assert!(plan.execute(&request).is_ok());
    }

    #[test]
    fn headers_merge_with_action_overrides() {
        let resource = bottles();
        let action = Action::new("show").with_headers(
            Attribute::object(vec![
                Field::new("X-Account", Attribute::string()),
                Field::new("X-Trace", Attribute::string()),
            ])
            .required(["X-Trace"]),
        );
        let merged = merged_headers(&resource, &action).unwrap();
        let names: Vec<_> = merged.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["X-Account", "X-Trace"]);
        assert!(merged.is_required("X-Account"));
        assert!(merged.is_required("X-Trace"));
    }

    #[test]
    fn reserved_members_are_rejected() {
        let resource = Resource::new("bottle").action(
            Action::new("show").with_params(Attribute::object(vec![Field::new(
                "payload",
                Attribute::string(),
            )])),
        );
        let err = ContextPlan::build(&resource, &resource.actions[0]).unwrap_err();
        assert!(matches!(err, GeneratorError::MissingDesignInput(_)));
    }

    // === render tests ===

    #[test]
    fn rendered_contexts_parse() {
        let version = ApiVersion::default_version().resource(bottles());
        let scope = TypeScope::new(&version, None, "app");
        let tokens = render_contexts(&scope).unwrap();
        let code = tokens.to_string();

        assert!(code.contains("pub struct ListBottleContext"));
        assert!(code.contains("pub struct CreateBottleContext"));
        assert!(code.contains("pub payload : super :: CreateBottlePayload"));
        assert!(code.contains("missing_header (\"X-Account\")"));
        assert!(code.contains("impl modelsmith :: RequestAccessor for ListBottleContext"));
        assert!(syn::parse2::<syn::File>(tokens).is_ok());
    }

    #[test]
    fn path_parameters_skip_presence_checks() {
        let version = ApiVersion::default_version().resource(bottles());
        let scope = TypeScope::new(&version, None, "app");
        let code = render_contexts(&scope).unwrap().to_string();

        assert!(!code.contains("missing_param (\"accountID\")"));
        assert!(code.contains("missing_param (\"count\")"));
    }

    #[test]
    fn optional_parameters_are_options() {
        let version = ApiVersion::default_version().resource(bottles());
        let scope = TypeScope::new(&version, None, "app");
        let code = render_contexts(&scope).unwrap().to_string();

        assert!(code.contains("pub account_id : i64"));
        assert!(code.contains("pub sort : Option < String >"));
        assert!(code.contains("pub years : Vec < i64 >"));
    }
}
