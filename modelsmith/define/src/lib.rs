//! Modelsmith Definition Library
//!
//! This crate provides the type model consumed by `modelsmith-gen`. A design
//! describes data types, their storage options and relationships, and the
//! resources and actions that read and render them.
//!
//! ## Core Types
//!
//! ### Attributes
//!
//! - [`Attribute`] - A typed value description with validations
//! - [`AttributeType`] - The closed set of value kinds
//! - [`Field`] / [`Object`] - Ordered named members of an object
//! - [`Validation`] - Required, non-zero, pattern, enum, range and length rules
//!
//! ### Types
//!
//! - [`UserType`] - A named type, optionally backed by storage
//! - [`MediaType`] - A response type with named [`View`]s
//! - [`StorageOptions`], [`PrimaryKey`], [`Relationship`]
//!
//! ### Resources
//!
//! - [`ApiDefinition`] / [`ApiVersion`] - The design root
//! - [`Resource`] / [`Action`] / [`Route`] / [`Response`]
//!
//! ## Examples
//!
//! ```
//! use modelsmith_define::prelude::*;
//!
//! let widget = UserType::new(
//!     "Widget",
//!     Attribute::object(vec![
//!         Field::new("id", Attribute::integer()),
//!         Field::new("label", Attribute::string()),
//!     ])
//!     .required(["id", "label"]),
//! )
//! .with_storage(StorageOptions::new().table("widgets"))
//! .with_primary_key(PrimaryKey::integer("id"));
//!
//! let api = ApiDefinition::new("shop").version(ApiVersion::default_version().user_type(widget));
//! assert_eq!(api.versions[0].user_types.len(), 1);
//! ```

pub mod action;
pub mod api;
pub mod attribute;
pub mod prelude;
pub mod types;

pub use action::{Action, Resource, Response, RestMethod, Route};
pub use api::{ApiDefinition, ApiVersion, DefinitionError};
pub use attribute::{Attribute, AttributeType, Field, Object, Validation};
pub use types::{KeyKind, MediaType, PrimaryKey, Relationship, StorageOptions, UserType, View};
