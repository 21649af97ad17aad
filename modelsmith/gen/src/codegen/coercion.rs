//! Coercion of raw request text into typed values.
//!
//! Path, query and header values arrive as strings. [`Coercion::compile`]
//! maps an attribute onto a small plan covering every kind that can be
//! expressed as text; the plan is then either rendered into the generated
//! context constructor or executed directly with [`Coercion::execute`].
//! Both paths call the same `modelsmith::coerce` parse functions, so the
//! executed plan is the reference behavior of the rendered code.
//!
//! ## Examples
//!
//! ```
//! use modelsmith_define::Attribute;
//! use modelsmith_gen::codegen::coercion::Coercion;
//! use serde_json::json;
//!
//! let plan = Coercion::compile("count", &Attribute::integer()).unwrap();
//! assert_eq!(plan.execute("count", "42").unwrap(), json!(42));
//! assert!(plan.execute("count", "abc").is_err());
//!
//! let plan = Coercion::compile("ids", &Attribute::array(Attribute::integer())).unwrap();
//! assert_eq!(plan.execute("ids", "1,2,3").unwrap(), json!([1, 2, 3]));
//! ```

use modelsmith::FieldError;
use modelsmith::coerce;
use modelsmith_define::{Attribute, AttributeType};
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};
use serde_json::Value;

use crate::errors::GeneratorError;

/// Hands out temporary identifiers that are unique within one artifact.
#[derive(Debug, Default)]
pub struct TempVars {
    next: usize,
}

impl TempVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh identifier such as `value0_3`.
    pub fn fresh(&mut self, prefix: &str, depth: usize) -> Ident {
        self.next += 1;
        format_ident!("{}{}_{}", prefix, depth, self.next)
    }
}

/// Kinds parsed from text with a failure branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Boolean,
    Integer,
    Number,
}

impl ScalarKind {
    /// The kind name cited in `InvalidFieldType` errors.
    pub fn expected(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Number => "number",
        }
    }

    pub fn rust_type(self) -> TokenStream {
        match self {
            Self::Boolean => quote!(bool),
            Self::Integer => quote!(i64),
            Self::Number => quote!(f64),
        }
    }

    fn parser(self) -> TokenStream {
        match self {
            Self::Boolean => quote!(modelsmith::coerce::boolean),
            Self::Integer => quote!(modelsmith::coerce::integer),
            Self::Number => quote!(modelsmith::coerce::number),
        }
    }

    fn execute(self, name: &str, raw: &str) -> Result<Value, FieldError> {
        let parsed = match self {
            Self::Boolean => coerce::boolean(raw).map(Value::Bool),
            Self::Integer => coerce::integer(raw).map(Value::from),
            Self::Number => coerce::number(raw).map(|n| {
                serde_json::Number::from_f64(n)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }),
        };
        parsed.ok_or_else(|| FieldError::invalid_type(name, raw, self.expected()))
    }
}

/// Kinds assigned from text without a parse step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    String,
    Any,
}

impl TextKind {
    fn rust_type(self) -> TokenStream {
        match self {
            Self::String => quote!(String),
            Self::Any => quote!(serde_json::Value),
        }
    }

    fn convert(self, raw: &TokenStream) -> TokenStream {
        match self {
            Self::String => quote!(#raw.to_string()),
            Self::Any => quote!(serde_json::Value::String(#raw.to_string())),
        }
    }
}

/// Element kind of a delimited array value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    Text(TextKind),
    Scalar(ScalarKind),
}

/// How one attribute is produced from raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// Parse and report `InvalidFieldType` on failure.
    Parse(ScalarKind),
    /// Assign the raw text; cannot fail.
    Assign(TextKind),
    /// Split on the array delimiter and coerce each element.
    Split(Element),
}

impl Coercion {
    /// Builds the plan for an attribute.
    ///
    /// ## Errors
    ///
    /// Returns `GeneratorError::UnsupportedCompositeShape` for objects and for
    /// arrays of arrays or objects, which have no text encoding.
    pub fn compile(name: &str, attribute: &Attribute) -> Result<Self, GeneratorError> {
        match &attribute.kind {
            AttributeType::Boolean => Ok(Self::Parse(ScalarKind::Boolean)),
            AttributeType::Integer => Ok(Self::Parse(ScalarKind::Integer)),
            AttributeType::Number => Ok(Self::Parse(ScalarKind::Number)),
            AttributeType::String => Ok(Self::Assign(TextKind::String)),
            AttributeType::Any => Ok(Self::Assign(TextKind::Any)),
            AttributeType::Array { element } => match &element.kind {
                AttributeType::String => Ok(Self::Split(Element::Text(TextKind::String))),
                AttributeType::Any => Ok(Self::Split(Element::Text(TextKind::Any))),
                AttributeType::Boolean => Ok(Self::Split(Element::Scalar(ScalarKind::Boolean))),
                AttributeType::Integer => Ok(Self::Split(Element::Scalar(ScalarKind::Integer))),
                AttributeType::Number => Ok(Self::Split(Element::Scalar(ScalarKind::Number))),
                AttributeType::Array { .. } => Err(GeneratorError::unsupported_shape(
                    name,
                    "arrays of arrays cannot be read from raw text",
                )),
                AttributeType::Object(_) => Err(GeneratorError::unsupported_shape(
                    name,
                    "arrays of objects cannot be read from raw text",
                )),
            },
            AttributeType::Object(_) => Err(GeneratorError::unsupported_shape(
                name,
                "objects are decoded from payloads, not read from raw text",
            )),
        }
    }

    /// The Rust type of a successfully coerced value.
    pub fn rust_type(&self) -> TokenStream {
        match self {
            Self::Parse(kind) => kind.rust_type(),
            Self::Assign(kind) => kind.rust_type(),
            Self::Split(Element::Text(kind)) => {
                let elem = kind.rust_type();
                quote!(Vec<#elem>)
            }
            Self::Split(Element::Scalar(kind)) => {
                let elem = kind.rust_type();
                quote!(Vec<#elem>)
            }
        }
    }

    /// Renders the coercion as statements.
    ///
    /// The fragment expects a `FieldErrors` binding named `errors` in scope.
    ///
    /// ## Arguments
    ///
    /// * `name` - Name cited in errors
    /// * `raw` - Expression of type `&str` holding the raw value
    /// * `target` - Place expression assigned on success
    /// * `pointer` - Wrap the assigned value in `Some(..)`
    /// * `depth` - Nesting depth, used to suffix temporaries
    /// * `vars` - Temporary identifier source for the artifact
    /// * `on_success` - Statements run against the coerced value before
    ///   assignment, typically validation checks
    pub fn render(
        &self,
        name: &str,
        raw: &TokenStream,
        target: &TokenStream,
        pointer: bool,
        depth: usize,
        vars: &mut TempVars,
        on_success: &dyn Fn(&Ident) -> TokenStream,
    ) -> TokenStream {
        let value = vars.fresh("value", depth);
        let success = on_success(&value);
        let assigned = if pointer {
            quote!(Some(#value))
        } else {
            quote!(#value)
        };

        match self {
            Self::Parse(kind) => {
                let parser = kind.parser();
                let expected = kind.expected();
                quote! {
                    match #parser(#raw) {
                        Some(#value) => {
                            #success
                            #target = #assigned;
                        }
                        None => errors.push(modelsmith::FieldError::invalid_type(#name, #raw, #expected)),
                    }
                }
            }
            Self::Assign(kind) => {
                let converted = kind.convert(raw);
                quote! {
                    {
                        let #value = #converted;
                        #success
                        #target = #assigned;
                    }
                }
            }
            Self::Split(Element::Text(kind)) => {
                let elem_type = kind.rust_type();
                let part = vars.fresh("part", depth + 1);
                let converted = kind.convert(&quote!(#part));
                quote! {
                    {
                        let #value: Vec<#elem_type> = modelsmith::coerce::split(#raw)
                            .into_iter()
                            .map(|#part| #converted)
                            .collect();
                        #success
                        #target = #value;
                    }
                }
            }
            Self::Split(Element::Scalar(kind)) => {
                let elem_type = kind.rust_type();
                let parser = kind.parser();
                let expected = kind.expected();
                let part = vars.fresh("part", depth + 1);
                let elem = vars.fresh("elem", depth + 1);
                let failed = vars.fresh("failed", depth);
                quote! {
                    {
                        let mut #value: Vec<#elem_type> = Vec::new();
                        let mut #failed: Option<modelsmith::FieldError> = None;
                        for #part in modelsmith::coerce::split(#raw) {
                            match #parser(#part) {
                                Some(#elem) => #value.push(#elem),
                                None => {
                                    #failed = Some(modelsmith::FieldError::invalid_type(#name, #part, #expected));
                                    break;
                                }
                            }
                        }
                        match #failed {
                            Some(error) => errors.push(error),
                            None => {
                                #success
                                #target = #value;
                            }
                        }
                    }
                }
            }
        }
    }

    /// Runs the plan against a raw value.
    ///
    /// Arrays stop at the first malformed element and report only that one.
    pub fn execute(&self, name: &str, raw: &str) -> Result<Value, FieldError> {
        match self {
            Self::Parse(kind) => kind.execute(name, raw),
            Self::Assign(_) => Ok(Value::String(raw.to_string())),
            Self::Split(Element::Text(_)) => Ok(Value::Array(
                coerce::split(raw)
                    .into_iter()
                    .map(|part| Value::String(part.to_string()))
                    .collect(),
            )),
            Self::Split(Element::Scalar(kind)) => coerce::split(raw)
                .into_iter()
                .map(|part| kind.execute(name, part))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
        }
    }
}

/// Identifier of the local holding a parameter's raw text.
pub fn raw_ident(name: &str) -> Ident {
    format_ident!("raw_{}", crate::naming::snake_case(name))
}

/// Compiles and renders the coercion of one attribute with no follow-up
/// checks.
///
/// ## Errors
///
/// See [`Coercion::compile`].
pub fn compile_coercion(
    name: &str,
    attribute: &Attribute,
    pointer: bool,
    target: &TokenStream,
    depth: usize,
    vars: &mut TempVars,
) -> Result<TokenStream, GeneratorError> {
    let raw = raw_ident(name);
    let plan = Coercion::compile(name, attribute)?;
    Ok(plan.render(
        name,
        &quote!(#raw),
        target,
        pointer,
        depth,
        vars,
        &|_| TokenStream::new(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    // === compile tests ===

    #[test]
    fn every_scalar_kind_compiles() {
        assert_eq!(
            Coercion::compile("b", &Attribute::boolean()).unwrap(),
            Coercion::Parse(ScalarKind::Boolean)
        );
        assert_eq!(
            Coercion::compile("s", &Attribute::string()).unwrap(),
            Coercion::Assign(TextKind::String)
        );
        assert_eq!(
            Coercion::compile("a", &Attribute::any()).unwrap(),
            Coercion::Assign(TextKind::Any)
        );
        assert_eq!(
            Coercion::compile("xs", &Attribute::array(Attribute::number())).unwrap(),
            Coercion::Split(Element::Scalar(ScalarKind::Number))
        );
    }

    #[test]
    fn composite_shapes_are_rejected() {
        let object = Attribute::object(vec![]);
        let nested = Attribute::array(Attribute::array(Attribute::integer()));
        let objects = Attribute::array(Attribute::object(vec![]));

        for attribute in [object, nested, objects] {
            let err = Coercion::compile("shape", &attribute).unwrap_err();
            assert!(matches!(
                err,
                GeneratorError::UnsupportedCompositeShape { ref name, .. } if name == "shape"
            ));
        }
    }

    // === execute tests ===

    #[test]
    fn integer_parses_and_reports_raw_text() {
        let plan = Coercion::compile("count", &Attribute::integer()).unwrap();
        assert_eq!(plan.execute("count", "42").unwrap(), json!(42));
        assert_eq!(
            plan.execute("count", "abc").unwrap_err(),
            FieldError::invalid_type("count", "abc", "integer")
        );
    }

    #[test]
    fn string_arrays_keep_empty_elements() {
        let plan = Coercion::compile("tags", &Attribute::array(Attribute::string())).unwrap();
        assert_eq!(plan.execute("tags", "a,,b").unwrap(), json!(["a", "", "b"]));
    }

    #[test]
    fn array_surfaces_first_bad_element_only() {
        let plan = Coercion::compile("ids", &Attribute::array(Attribute::integer())).unwrap();
        assert_eq!(
            plan.execute("ids", "1,x,y").unwrap_err(),
            FieldError::invalid_type("ids", "x", "integer")
        );
    }

    // === render tests ===

    #[test]
    fn render_parse_has_failure_branch() {
        let mut vars = TempVars::new();
        let code = compile_coercion(
            "count",
            &Attribute::integer(),
            true,
            &quote!(count),
            0,
            &mut vars,
        )
        .unwrap()
        .to_string();

        assert!(code.contains("modelsmith :: coerce :: integer (raw_count)"));
        assert!(code.contains("invalid_type (\"count\" , raw_count , \"integer\")"));
        assert!(code.contains("Some (value0_1)"));
    }

    #[test]
    fn render_string_has_no_parse_step() {
        let mut vars = TempVars::new();
        let code = compile_coercion("name", &Attribute::string(), false, &quote!(name), 0, &mut vars)
            .unwrap()
            .to_string();

        assert!(!code.contains("coerce ::"));
        assert!(code.contains("raw_name . to_string ()"));
        assert!(!code.contains("Some"));
    }

    #[test]
    fn render_scalar_array_breaks_on_first_error() {
        let mut vars = TempVars::new();
        let code = compile_coercion(
            "ids",
            &Attribute::array(Attribute::integer()),
            false,
            &quote!(ids),
            0,
            &mut vars,
        )
        .unwrap()
        .to_string();

        assert!(code.contains("modelsmith :: coerce :: split (raw_ids)"));
        assert!(code.contains("break"));
        assert!(code.contains("Vec < i64 >"));
    }

    #[test]
    fn temporaries_are_unique_per_artifact() {
        let mut vars = TempVars::new();
        let first = vars.fresh("value", 0);
        let second = vars.fresh("value", 0);
        let nested = vars.fresh("elem", 1);
        assert_ne!(first, second);
        assert_eq!(nested.to_string(), "elem1_3");
    }

    #[test]
    fn rendered_fragments_parse_as_statements() {
        let mut vars = TempVars::new();
        for attribute in [
            Attribute::boolean(),
            Attribute::number(),
            Attribute::any(),
            Attribute::array(Attribute::string()),
            Attribute::array(Attribute::boolean()),
        ] {
            let fragment =
                compile_coercion("x", &attribute, false, &quote!(x), 0, &mut vars).unwrap();
            let block = quote! { fn check(raw_x: &str) { #fragment } };
            assert!(syn::parse2::<syn::ItemFn>(block).is_ok());
        }
    }

    proptest! {
        #[test]
        fn integers_round_trip(n in any::<i64>()) {
            let plan = Coercion::Parse(ScalarKind::Integer);
            prop_assert_eq!(plan.execute("n", &n.to_string()).unwrap(), json!(n));
        }

        #[test]
        fn malformed_integers_cite_raw_text(raw in "[a-z]{1,8}") {
            let plan = Coercion::Parse(ScalarKind::Integer);
            prop_assert_eq!(
                plan.execute("n", &raw).unwrap_err(),
                FieldError::invalid_type("n", raw.clone(), "integer")
            );
        }

        #[test]
        fn joined_arrays_match_elementwise(values in prop::collection::vec(any::<i64>(), 1..8)) {
            let raw = values.iter().map(i64::to_string).collect::<Vec<_>>().join(",");
            let array = Coercion::Split(Element::Scalar(ScalarKind::Integer));
            let scalar = Coercion::Parse(ScalarKind::Integer);

            let expected: Vec<Value> = values
                .iter()
                .map(|v| scalar.execute("ids", &v.to_string()).unwrap())
                .collect();
            prop_assert_eq!(array.execute("ids", &raw).unwrap(), Value::Array(expected));
        }

        #[test]
        fn booleans_round_trip(b in any::<bool>()) {
            let plan = Coercion::Parse(ScalarKind::Boolean);
            prop_assert_eq!(plan.execute("flag", &b.to_string()).unwrap(), json!(b));
        }
    }
}
