//! Code generation modules for modelsmith.
//!
//! Each submodule renders one part of the generated crate from the design
//! model in `modelsmith-define`.
//!
//! ## Submodules
//!
//! - [`coercion`] - Raw text to typed value conversion, recursively for arrays
//! - [`checks`] - Value-level validation snippets shared by every renderer
//! - [`decode`] - Field-by-field decoding of object values
//! - [`types`] - User type structs with `decode`, `load` and `validate`
//! - [`media_type`] - Media types, their view selectors and projections
//! - [`context`] - Per-action request contexts
//! - [`response`] - Response senders attached to each context
//! - [`hrefs`] - Href factories for resources with a canonical action
//! - [`model`] - Storage models and their data-access objects
//! - [`module_docs`] - Module-level documentation of generated files
//!
//! ## Output Format
//!
//! All renderers return `proc_macro2::TokenStream`, which is then:
//! - Validated with `syn::parse2` to ensure correctness
//! - Formatted with `prettyplease` for consistent style
//!
//! See [`crate::output`] for validation and file writing, and
//! [`crate::generator`] for the order renderers run in.

pub mod checks;
pub mod coercion;
pub mod context;
pub mod decode;
pub mod hrefs;
pub mod media_type;
pub mod model;
pub mod module_docs;
pub mod response;
pub mod types;

pub use coercion::{Coercion, TempVars, compile_coercion};
pub use context::{ContextPlan, render_contexts};
pub use hrefs::render_hrefs;
pub use media_type::render_media_types;
pub use model::{ModelPlan, render_model, render_models_index};
pub use module_docs::{ModuleDocBuilder, crate_docs};
pub use types::{TypeScope, render_user_types};
