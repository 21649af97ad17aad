//! Convenient re-exports for writing designs.
//!
//! ## Examples
//!
//! ```
//! use modelsmith_define::prelude::*;
//!
//! let bottle = MediaType::new(
//!     UserType::new(
//!         "Bottle",
//!         Attribute::object(vec![Field::new("id", Attribute::integer())]).required(["id"]),
//!     ),
//!     "application/vnd.cellar.bottle+json",
//! )
//! .with_view(View::new("default", ["id"]));
//!
//! assert_eq!(bottle.name(), "Bottle");
//! ```

pub use crate::action::{Action, Resource, Response, RestMethod, Route};
pub use crate::api::{ApiDefinition, ApiVersion};
pub use crate::attribute::{Attribute, AttributeType, Field, Object, Validation};
pub use crate::types::{
    KeyKind, MediaType, PrimaryKey, Relationship, StorageOptions, UserType, View,
};
