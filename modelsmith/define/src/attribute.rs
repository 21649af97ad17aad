//! Attribute and validation primitives.
//!
//! An [`Attribute`] is a typed value description with optional validation
//! rules. Objects hold an ordered list of named [`Field`]s; whether a field is
//! optional is decided by the enclosing object's [`Validation::Required`] set,
//! never by the field itself.
//!
//! ## Examples
//!
//! ```
//! use modelsmith_define::{Attribute, Field};
//!
//! let bottle = Attribute::object(vec![
//!     Field::new("id", Attribute::integer()),
//!     Field::new("name", Attribute::string().min_length(2)),
//!     Field::new("vintage", Attribute::integer().minimum(1900.0)),
//! ])
//! .required(["id", "name"]);
//!
//! assert!(bottle.is_required("name"));
//! assert!(!bottle.is_required("vintage"));
//! assert_eq!(bottle.fields().len(), 3);
//! ```

use serde::{Deserialize, Serialize};
use strum::Display;

/// The closed set of value kinds a design can describe.
///
/// `Array` and `Object` are the only composite kinds; every other variant is
/// a leaf. The `Display` form is the lowercase kind name used in error
/// messages (`"integer"`, `"number"`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Display)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[strum(serialize_all = "lowercase")]
pub enum AttributeType {
    Boolean,
    Integer,
    Number,
    String,
    /// Opaque value passed through untouched.
    Any,
    Array {
        element: Box<Attribute>,
    },
    Object(Object),
}

/// An ordered set of named fields.
///
/// `type_name` is set when the object is a named user or media type
/// referenced from another type; anonymous objects leave it empty and are
/// rendered as nested structs named after their owner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Object {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
}

/// A named member of an [`Object`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub attribute: Attribute,
}

impl Field {
    pub fn new(name: impl Into<String>, attribute: Attribute) -> Self {
        Self {
            name: name.into(),
            attribute,
        }
    }
}

/// A validation rule attached to an [`Attribute`].
///
/// `Required` and `NonZero` are object-level rules naming member fields.
/// The rest apply to the value of the attribute that carries them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "value", rename_all = "snake_case")]
pub enum Validation {
    Required(Vec<String>),
    NonZero(Vec<String>),
    Pattern(String),
    Enum(Vec<serde_json::Value>),
    Minimum(f64),
    Maximum(f64),
    MinLength(usize),
    MaxLength(usize),
}

/// A typed value description plus its validations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(flatten)]
    pub kind: AttributeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validations: Vec<Validation>,
}

impl Attribute {
    /// Creates an attribute of the given kind with no validations.
    pub fn new(kind: AttributeType) -> Self {
        Self {
            kind,
            description: None,
            validations: Vec::new(),
        }
    }

    pub fn boolean() -> Self {
        Self::new(AttributeType::Boolean)
    }

    pub fn integer() -> Self {
        Self::new(AttributeType::Integer)
    }

    pub fn number() -> Self {
        Self::new(AttributeType::Number)
    }

    pub fn string() -> Self {
        Self::new(AttributeType::String)
    }

    pub fn any() -> Self {
        Self::new(AttributeType::Any)
    }

    pub fn array(element: Attribute) -> Self {
        Self::new(AttributeType::Array {
            element: Box::new(element),
        })
    }

    /// Creates an anonymous object attribute.
    pub fn object(fields: Vec<Field>) -> Self {
        Self::new(AttributeType::Object(Object {
            type_name: None,
            fields,
        }))
    }

    /// Creates an object attribute that refers to a named type.
    ///
    /// ## Examples
    ///
    /// ```
    /// use modelsmith_define::{Attribute, Field};
    ///
    /// let account = Attribute::named("Account", vec![Field::new("id", Attribute::integer())]);
    /// assert_eq!(account.type_name(), Some("Account"));
    /// ```
    pub fn named(type_name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self::new(AttributeType::Object(Object {
            type_name: Some(type_name.into()),
            fields,
        }))
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_validation(mut self, validation: Validation) -> Self {
        self.validations.push(validation);
        self
    }

    /// Marks the named member fields as required.
    pub fn required<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_validation(Validation::Required(
            names.into_iter().map(Into::into).collect(),
        ))
    }

    /// Marks the named member fields as non-zero.
    pub fn non_zero<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_validation(Validation::NonZero(
            names.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn pattern(self, pattern: impl Into<String>) -> Self {
        self.with_validation(Validation::Pattern(pattern.into()))
    }

    pub fn one_of(self, values: Vec<serde_json::Value>) -> Self {
        self.with_validation(Validation::Enum(values))
    }

    pub fn minimum(self, min: f64) -> Self {
        self.with_validation(Validation::Minimum(min))
    }

    pub fn maximum(self, max: f64) -> Self {
        self.with_validation(Validation::Maximum(max))
    }

    pub fn min_length(self, len: usize) -> Self {
        self.with_validation(Validation::MinLength(len))
    }

    pub fn max_length(self, len: usize) -> Self {
        self.with_validation(Validation::MaxLength(len))
    }

    /// Returns the member fields of an object attribute, or an empty slice.
    pub fn fields(&self) -> &[Field] {
        match &self.kind {
            AttributeType::Object(object) => &object.fields,
            _ => &[],
        }
    }

    /// Looks up a member field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields().iter().find(|f| f.name == name)
    }

    /// Returns the referenced type name for named object attributes.
    pub fn type_name(&self) -> Option<&str> {
        match &self.kind {
            AttributeType::Object(object) => object.type_name.as_deref(),
            _ => None,
        }
    }

    /// Returns the element attribute of an array.
    pub fn element(&self) -> Option<&Attribute> {
        match &self.kind {
            AttributeType::Array { element } => Some(element),
            _ => None,
        }
    }

    /// Returns `true` if `name` appears in any `Required` rule of this object.
    pub fn is_required(&self, name: &str) -> bool {
        self.validations.iter().any(|v| match v {
            Validation::Required(names) => names.iter().any(|n| n == name),
            _ => false,
        })
    }

    /// Returns `true` if `name` appears in any `NonZero` rule of this object.
    pub fn is_non_zero(&self, name: &str) -> bool {
        self.validations.iter().any(|v| match v {
            Validation::NonZero(names) => names.iter().any(|n| n == name),
            _ => false,
        })
    }

    /// Returns `true` for boolean, integer, number and string kinds.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self.kind,
            AttributeType::Boolean
                | AttributeType::Integer
                | AttributeType::Number
                | AttributeType::String
        )
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind, AttributeType::Object(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, AttributeType::Array { .. })
    }

    /// Returns `true` if the named member must be rendered as an optional
    /// (`Option<T>`) value: a primitive or object member that is not required.
    ///
    /// Arrays and `Any` members are never wrapped since they already carry an
    /// empty representation.
    pub fn is_pointer(&self, name: &str) -> bool {
        match self.field(name) {
            Some(field) => {
                (field.attribute.is_primitive() || field.attribute.is_object())
                    && !self.is_required(name)
            }
            None => false,
        }
    }

    /// Iterates over the value-level validations (everything except
    /// `Required` and `NonZero`).
    pub fn value_validations(&self) -> impl Iterator<Item = &Validation> {
        self.validations
            .iter()
            .filter(|v| !matches!(v, Validation::Required(_) | Validation::NonZero(_)))
    }
}
