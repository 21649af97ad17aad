//! Struct rendering for user types and payloads.
//!
//! Every object attribute becomes a plain data struct deriving serde, plus
//! an inherent `decode`/`load`/`validate` surface:
//!
//! ```text
//! Boolean -> bool           Array(T)         -> Vec<T>
//! Integer -> i64            Any              -> serde_json::Value
//! Number  -> f64            Object (named)   -> the named type
//! String  -> String         Object (inline)  -> struct {Owner}{Field}
//! ```
//!
//! Members that are primitive or object and not required are wrapped in
//! `Option`. Arrays and `Any` already have an empty value and never are.

use modelsmith_define::{ApiVersion, Attribute, AttributeType, Field, UserType};
use proc_macro2::{Ident, TokenStream};
use quote::quote;

use super::checks::{CheckTarget, render_non_zero, render_present, render_value_checks};
use super::coercion::TempVars;
use super::decode::render_decode_fn;
use crate::errors::GeneratorError;
use crate::naming::{ident, type_ident, upper_camel};

/// The Rust shape of a member value.
#[derive(Debug, Clone)]
pub enum Shape {
    Boolean,
    Integer,
    Number,
    String,
    Any,
    List(Box<Shape>),
    /// A generated struct, either a referenced type or an inline object.
    Named { name: String, path: TokenStream },
}

impl Shape {
    pub fn rust_type(&self) -> TokenStream {
        match self {
            Self::Boolean => quote!(bool),
            Self::Integer => quote!(i64),
            Self::Number => quote!(f64),
            Self::String => quote!(String),
            Self::Any => quote!(serde_json::Value),
            Self::List(element) => {
                let element = element.rust_type();
                quote!(Vec<#element>)
            }
            Self::Named { path, .. } => path.clone(),
        }
    }

    /// Returns `true` when the value contains generated structs.
    pub fn has_named(&self) -> bool {
        match self {
            Self::Named { .. } => true,
            Self::List(element) => element.has_named(),
            _ => false,
        }
    }
}

/// Resolves type names referenced from one version's artifacts.
pub struct TypeScope<'a> {
    version: &'a ApiVersion,
    default: Option<&'a ApiVersion>,
    app_module: Ident,
}

impl<'a> TypeScope<'a> {
    pub fn new(version: &'a ApiVersion, default: Option<&'a ApiVersion>, app_module: &str) -> Self {
        Self {
            version,
            default,
            app_module: ident(app_module),
        }
    }

    pub fn version(&self) -> &'a ApiVersion {
        self.version
    }

    /// Returns `true` if `name` is rendered inside this version's module.
    pub fn is_local(&self, name: &str) -> bool {
        self.version.media_type_by_name(name).is_some()
            || self.version.user_type_by_name(name).is_some()
            || self.payload_types().iter().any(|p| p.name == name)
    }

    /// Returns the path of a named type relative to a sibling module of the
    /// version.
    ///
    /// ## Errors
    ///
    /// Returns `GeneratorError::MissingDesignInput` when the name is neither
    /// declared in this version nor in the default version.
    pub fn resolve(&self, name: &str) -> Result<TokenStream, GeneratorError> {
        self.resolve_as(name, &type_ident(name))
    }

    /// Resolves the view selector enum of a media type.
    pub fn resolve_view(&self, name: &str) -> Result<TokenStream, GeneratorError> {
        self.resolve_as(name, &view_ident(name))
    }

    fn resolve_as(&self, name: &str, ty: &Ident) -> Result<TokenStream, GeneratorError> {
        if self.is_local(name) {
            return Ok(quote!(super::#ty));
        }
        let in_default = self.default.is_some_and(|d| {
            d.media_type_by_name(name).is_some() || d.user_type_by_name(name).is_some()
        });
        if in_default {
            let app = &self.app_module;
            Ok(quote!(crate::#app::#ty))
        } else {
            Err(GeneratorError::design(format!(
                "type '{name}' is referenced but not declared"
            )))
        }
    }

    /// Looks up a media type visible from this version.
    pub fn media_type(&self, name: &str) -> Option<&'a modelsmith_define::MediaType> {
        self.version.media_type_by_name(name).or_else(|| {
            self.default
                .filter(|_| !self.is_local(name))
                .and_then(|d| d.media_type_by_name(name))
        })
    }

    /// Looks up a media type by content identifier, this version first.
    pub fn media_type_by_identifier(
        &self,
        identifier: &str,
    ) -> Option<&'a modelsmith_define::MediaType> {
        self.version
            .media_type_by_identifier(identifier)
            .or_else(|| self.default.and_then(|d| d.media_type_by_identifier(identifier)))
    }

    /// Action payload types that are not also declared as user or media
    /// types, deduplicated by name in declaration order.
    pub fn payload_types(&self) -> Vec<&'a UserType> {
        let mut seen: Vec<&'a UserType> = Vec::new();
        for resource in &self.version.resources {
            for action in &resource.actions {
                if let Some(payload) = &action.payload
                    && self.version.user_type_by_name(&payload.name).is_none()
                    && self.version.media_type_by_name(&payload.name).is_none()
                    && !seen.iter().any(|p| p.name == payload.name)
                {
                    seen.push(payload);
                }
            }
        }
        seen
    }

    /// Types `user_types.rs` renders: declared user types not shadowed by a
    /// media type of the same name, then action payload types.
    pub fn rendered_user_types(&self) -> Vec<&'a UserType> {
        self.version
            .user_types
            .iter()
            .filter(|u| self.version.media_type_by_name(&u.name).is_none())
            .chain(self.payload_types())
            .collect()
    }
}

/// Identifier of a media type's view selector enum.
pub fn view_ident(name: &str) -> Ident {
    type_ident(&format!("{}View", upper_camel(name)))
}

/// Per-member rendering decisions.
pub struct FieldPlan<'f> {
    pub field: &'f Field,
    pub ident: Ident,
    pub shape: Shape,
    /// Rendered as `Option<T>`.
    pub optional: bool,
    pub required: bool,
    pub non_zero: bool,
}

impl FieldPlan<'_> {
    pub fn field_type(&self) -> TokenStream {
        let ty = self.shape.rust_type();
        if self.optional {
            quote!(Option<#ty>)
        } else {
            ty
        }
    }
}

/// Renders structs into one artifact, collecting inline nested structs.
pub struct ObjectRenderer<'s, 'a> {
    scope: &'s TypeScope<'a>,
    vars: TempVars,
    nested: Vec<TokenStream>,
}

impl<'s, 'a> ObjectRenderer<'s, 'a> {
    pub fn new(scope: &'s TypeScope<'a>) -> Self {
        Self {
            scope,
            vars: TempVars::new(),
            nested: Vec::new(),
        }
    }

    pub fn scope(&self) -> &'s TypeScope<'a> {
        self.scope
    }

    pub fn vars(&mut self) -> &mut TempVars {
        &mut self.vars
    }

    /// Inline structs rendered so far, in discovery order.
    pub fn take_nested(&mut self) -> Vec<TokenStream> {
        std::mem::take(&mut self.nested)
    }

    /// Maps an attribute to its shape, rendering inline objects on the way.
    ///
    /// ## Arguments
    ///
    /// * `owner` - Name inline objects are derived from (`{Owner}{Field}`)
    /// * `attribute` - The member attribute
    pub fn shape(&mut self, owner: &str, attribute: &Attribute) -> Result<Shape, GeneratorError> {
        Ok(match &attribute.kind {
            AttributeType::Boolean => Shape::Boolean,
            AttributeType::Integer => Shape::Integer,
            AttributeType::Number => Shape::Number,
            AttributeType::String => Shape::String,
            AttributeType::Any => Shape::Any,
            AttributeType::Array { element } => Shape::List(Box::new(self.shape(owner, element)?)),
            AttributeType::Object(object) => match &object.type_name {
                Some(name) => Shape::Named {
                    name: name.clone(),
                    path: self.scope.resolve(name)?,
                },
                None => {
                    let name = upper_camel(owner);
                    let rendered = self.render_object(&name, "", attribute)?;
                    self.nested.push(rendered);
                    let ty = type_ident(&name);
                    Shape::Named {
                        name,
                        path: quote!(#ty),
                    }
                }
            },
        })
    }

    /// Plans every member of an object attribute.
    pub fn plan_fields<'f>(
        &mut self,
        owner: &str,
        attribute: &'f Attribute,
    ) -> Result<Vec<FieldPlan<'f>>, GeneratorError> {
        attribute
            .fields()
            .iter()
            .map(|field| {
                let shape = self.shape(&format!("{owner}_{}", field.name), &field.attribute)?;
                Ok(FieldPlan {
                    field,
                    ident: ident(&field.name),
                    shape,
                    optional: attribute.is_pointer(&field.name),
                    required: attribute.is_required(&field.name),
                    non_zero: attribute.is_non_zero(&field.name),
                })
            })
            .collect()
    }

    /// Renders a struct with its `decode`, `load`, `validate` and
    /// `collect_errors` functions.
    pub fn render_object(
        &mut self,
        name: &str,
        description: &str,
        attribute: &Attribute,
    ) -> Result<TokenStream, GeneratorError> {
        if !attribute.is_object() {
            return Err(GeneratorError::unsupported_shape(
                name,
                "only object types can be rendered as structs",
            ));
        }
        let plans = self.plan_fields(name, attribute)?;
        let definition = render_struct_definition(name, description, &plans);
        let methods = self.render_methods(&plans)?;
        let ty = type_ident(name);

        Ok(quote! {
            #definition

            impl #ty {
                #methods
            }
        })
    }

    /// Renders the inherent methods shared by every generated struct.
    pub fn render_methods(&mut self, plans: &[FieldPlan<'_>]) -> Result<TokenStream, GeneratorError> {
        let decode = render_decode_fn(plans, &mut self.vars);
        let collect = self.render_collect_errors(plans)?;
        Ok(quote! {
            #decode

            /// Decodes and validates a JSON value.
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

            /// Checks the declared rules.
            ///
            /// ## Errors
            ///
            /// Returns every failed rule.
            pub fn validate(&self) -> Result<(), modelsmith::FieldErrors> {
                let mut errors = modelsmith::FieldErrors::new();
                self.collect_errors("", &mut errors);
                errors.into_result()
            }

            #collect
        })
    }

    fn render_collect_errors(&mut self, plans: &[FieldPlan<'_>]) -> Result<TokenStream, GeneratorError> {
        let mut own = Vec::new();
        for plan in plans {
            if let Some(checks) = own_checks(plan)? {
                own.push(checks);
            }
        }
        let mut children = Vec::new();
        for plan in plans {
            if let Some(checks) = self.child_checks(plan)? {
                children.push(checks);
            }
        }

        if own.is_empty() && children.is_empty() {
            return Ok(quote! {
                /// Appends failed rules to `errors`.
                pub fn collect_errors(&self, _context: &str, _errors: &mut modelsmith::FieldErrors) {}
            });
        }
        Ok(quote! {
            /// Appends failed rules to `errors`, own members first, then
            /// nested values in member order.
            pub fn collect_errors(&self, context: &str, errors: &mut modelsmith::FieldErrors) {
                #(#own)*
                #(#children)*
            }
        })
    }

    fn child_checks(&mut self, plan: &FieldPlan<'_>) -> Result<Option<TokenStream>, GeneratorError> {
        let name = plan.field.name.as_str();
        let ident = &plan.ident;
        let body = match &plan.shape {
            Shape::Named { .. } if plan.optional => quote! {
                if let Some(value) = &self.#ident {
                    value.collect_errors(&path, errors);
                }
            },
            Shape::Named { .. } => quote!(self.#ident.collect_errors(&path, errors);),
            Shape::List(element) => {
                let Some(element_attr) = plan.field.attribute.element() else {
                    return Ok(None);
                };
                match list_checks(element_attr, element, &quote!(&self.#ident), &quote!(&path), 0, &mut self.vars)? {
                    Some(body) => body,
                    None => return Ok(None),
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(quote! {
            {
                let path = modelsmith::decode::path(context, #name);
                #body
            }
        }))
    }
}

fn own_checks(plan: &FieldPlan<'_>) -> Result<Option<TokenStream>, GeneratorError> {
    let name = plan.field.name.as_str();
    let ident = &plan.ident;
    let value = if plan.optional {
        quote!(value)
    } else {
        quote!(&self.#ident)
    };
    let target = CheckTarget {
        name: quote!(&path),
        value,
        errors: quote!(errors),
    };

    let mut checks = render_value_checks(&plan.field.attribute, &target)?;
    if plan.non_zero && !matches!(plan.shape, Shape::Named { .. }) {
        checks.extend(render_non_zero(&target));
    }
    if plan.required && matches!(plan.shape, Shape::Any) {
        checks.extend(render_present(&target));
    }
    if checks.is_empty() {
        return Ok(None);
    }

    let body = if plan.optional {
        quote! {
            if let Some(value) = &self.#ident {
                #checks
            }
        }
    } else {
        checks
    };
    Ok(Some(quote! {
        {
            let path = modelsmith::decode::path(context, #name);
            #body
        }
    }))
}

/// Renders a loop validating list elements, or `None` when elements carry
/// no rules.
fn list_checks(
    element_attr: &Attribute,
    element: &Shape,
    list: &TokenStream,
    path: &TokenStream,
    depth: usize,
    vars: &mut TempVars,
) -> Result<Option<TokenStream>, GeneratorError> {
    let index = vars.fresh("index", depth);
    let item = vars.fresh("item", depth);
    let item_path = vars.fresh("path", depth);

    let own = render_value_checks(
        element_attr,
        &CheckTarget {
            name: quote!(&#item_path),
            value: quote!(#item),
            errors: quote!(errors),
        },
    )?;
    let nested = match element {
        Shape::Named { .. } => quote!(#item.collect_errors(&#item_path, errors);),
        Shape::List(inner) => match element_attr.element() {
            Some(inner_attr) => list_checks(
                inner_attr,
                inner,
                &quote!(#item),
                &quote!(&#item_path),
                depth + 1,
                vars,
            )?
            .unwrap_or_default(),
            None => TokenStream::new(),
        },
        _ => TokenStream::new(),
    };

    if own.is_empty() && nested.is_empty() {
        return Ok(None);
    }
    Ok(Some(quote! {
        for (#index, #item) in (#list).iter().enumerate() {
            let #item_path = modelsmith::decode::index(#path, #index);
            #own
            #nested
        }
    }))
}

/// Renders the struct item with its derives and serde attributes.
pub fn render_struct_definition(name: &str, description: &str, plans: &[FieldPlan<'_>]) -> TokenStream {
    let ty = type_ident(name);
    let doc = if description.is_empty() {
        format!(" `{name}` type.")
    } else {
        format!(" {description}")
    };
    let fields = plans.iter().map(|plan| {
        let ident = &plan.ident;
        let field_type = plan.field_type();
        let mut attrs = Vec::new();
        if let Some(description) = &plan.field.attribute.description {
            let description = format!(" {description}");
            attrs.push(quote!(#[doc = #description]));
        }
        let rendered = ident.to_string();
        if rendered.trim_start_matches("r#") != plan.field.name {
            let original = plan.field.name.as_str();
            attrs.push(quote!(#[serde(rename = #original)]));
        }
        if plan.optional {
            attrs.push(quote!(#[serde(skip_serializing_if = "Option::is_none")]));
        }
        quote! {
            #(#attrs)*
            pub #ident: #field_type
        }
    });

    quote! {
        #[doc = #doc]
        #[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(default)]
        pub struct #ty {
            #(#fields),*
        }
    }
}

/// Renders a version's `user_types.rs` from
/// [`TypeScope::rendered_user_types`].
pub fn render_user_types(scope: &TypeScope<'_>) -> Result<TokenStream, GeneratorError> {
    let mut renderer = ObjectRenderer::new(scope);
    let mut items = Vec::new();

    for user_type in scope.rendered_user_types() {
        items.push(renderer.render_object(
            &user_type.name,
            &user_type.description,
            &user_type.attribute,
        )?);
        items.extend(renderer.take_nested());
    }

    Ok(quote! {
        //! User and payload types.

        #(#items)*
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelsmith_define::{Action, MediaType, Resource};
    use serde_json::json;

    fn version() -> ApiVersion {
        let address = UserType::new(
            "Address",
            Attribute::object(vec![
                Field::new("street", Attribute::string().min_length(1)),
                Field::new("city", Attribute::string()),
            ])
            .required(["street"]),
        );
        let account = UserType::new(
            "Account",
            Attribute::object(vec![
                Field::new("id", Attribute::integer()),
                Field::new("name", Attribute::string().pattern("^[A-Z]")),
                Field::new("type", Attribute::string().one_of(vec![json!("basic"), json!("pro")])),
                Field::new("address", Attribute::named("Address", vec![])),
                Field::new(
                    "geo",
                    Attribute::object(vec![Field::new("lat", Attribute::number())]),
                ),
                Field::new("tags", Attribute::array(Attribute::string().max_length(8))),
                Field::new("extra", Attribute::any()),
            ])
            .required(["id", "name", "extra"])
            .non_zero(["id"]),
        );
        ApiVersion::default_version()
            .user_type(address)
            .user_type(account)
            .resource(
                Resource::new("account").action(Action::new("create").with_payload(UserType::new(
                    "CreateAccountPayload",
                    Attribute::object(vec![Field::new("name", Attribute::string())]),
                ))),
            )
    }

    #[test]
    fn optionality_follows_required_set() {
        let version = version();
        let scope = TypeScope::new(&version, None, "app");
        let mut renderer = ObjectRenderer::new(&scope);
        let account = &version.user_types[1];
        let plans = renderer.plan_fields("Account", &account.attribute).unwrap();

        let types: Vec<String> = plans.iter().map(|p| p.field_type().to_string()).collect();
        assert_eq!(types[0], "i64");
        assert_eq!(types[1], "String");
        assert_eq!(types[2], "Option < String >");
        assert_eq!(types[3], "Option < super :: Address >");
        assert_eq!(types[4], "Option < AccountGeo >");
        assert_eq!(types[5], "Vec < String >");
        assert_eq!(types[6], "serde_json :: Value");
    }

    #[test]
    fn inline_objects_become_nested_structs() {
        let version = version();
        let scope = TypeScope::new(&version, None, "app");
        let mut renderer = ObjectRenderer::new(&scope);
        let account = &version.user_types[1];
        renderer
            .render_object("Account", "", &account.attribute)
            .unwrap();

        let nested = renderer.take_nested();
        assert_eq!(nested.len(), 1);
        assert!(nested[0].to_string().contains("pub struct AccountGeo"));
    }

    #[test]
    fn keyword_members_are_renamed() {
        let version = version();
        let scope = TypeScope::new(&version, None, "app");
        let mut renderer = ObjectRenderer::new(&scope);
        let code = renderer
            .render_object("Account", "", &version.user_types[1].attribute)
            .unwrap()
            .to_string();

        assert!(code.contains("pub r#type : Option < String >"));
        assert!(!code.contains("rename = \"type\""));
    }

    #[test]
    fn camel_case_members_keep_their_wire_name() {
        let attribute = Attribute::object(vec![Field::new("bottleID", Attribute::integer())])
            .required(["bottleID"]);
        let version = ApiVersion::default_version();
        let scope = TypeScope::new(&version, None, "app");
        let mut renderer = ObjectRenderer::new(&scope);
        let code = renderer
            .render_object("Pick", "", &attribute)
            .unwrap()
            .to_string();

        assert!(code.contains("pub bottle_id : i64"));
        assert!(code.contains("rename = \"bottleID\""));
    }

    #[test]
    fn validation_runs_own_rules_before_children() {
        let version = version();
        let scope = TypeScope::new(&version, None, "app");
        let mut renderer = ObjectRenderer::new(&scope);
        let code = renderer
            .render_object("Account", "", &version.user_types[1].attribute)
            .unwrap()
            .to_string();

        let pattern = code.find("validate :: pattern").unwrap();
        let non_zero = code.find("validate :: non_zero").unwrap();
        let present = code.find("validate :: present").unwrap();
        let child = code.find("collect_errors (& path , errors)").unwrap();
        assert!(pattern < child && non_zero < child && present < child);
    }

    #[test]
    fn unknown_references_are_design_errors() {
        let version = ApiVersion::default_version().user_type(UserType::new(
            "Bottle",
            Attribute::object(vec![Field::new("winery", Attribute::named("Winery", vec![]))]),
        ));
        let scope = TypeScope::new(&version, None, "app");
        let err = render_user_types(&scope).unwrap_err();
        assert!(matches!(err, GeneratorError::MissingDesignInput(_)));
    }

    #[test]
    fn references_fall_back_to_default_version() {
        let default = ApiVersion::default_version()
            .user_type(UserType::new("Address", Attribute::object(vec![])));
        let v1 = ApiVersion::new("v1");
        let scope = TypeScope::new(&v1, Some(&default), "app");
        assert_eq!(
            scope.resolve("Address").unwrap().to_string(),
            "crate :: app :: Address"
        );
    }

    #[test]
    fn user_types_skip_media_type_names_and_add_payloads() {
        let version = version().media_type(MediaType::new(
            UserType::new("Address", Attribute::object(vec![])),
            "application/vnd.address+json",
        ));
        let scope = TypeScope::new(&version, None, "app");
        let tokens = render_user_types(&scope).unwrap();
        let code = tokens.to_string();

        assert!(!code.contains("pub struct Address"));
        assert!(code.contains("pub struct Account"));
        assert!(code.contains("pub struct CreateAccountPayload"));
        assert!(syn::parse2::<syn::File>(tokens).is_ok());

        let names: Vec<&str> = scope.rendered_user_types().iter().map(|u| u.name.as_str()).collect();
        assert!(!names.contains(&"Address"));
        assert_eq!(names.last(), Some(&"CreateAccountPayload"));
    }

    #[test]
    fn versions_without_user_types_render_none() {
        let version = ApiVersion::new("v1").media_type(MediaType::new(
            UserType::new("Address", Attribute::object(vec![])),
            "application/vnd.address+json",
        ));
        let scope = TypeScope::new(&version, None, "app");
        assert!(scope.rendered_user_types().is_empty());
    }
}
