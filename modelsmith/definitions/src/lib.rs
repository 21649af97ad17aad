//! Modelsmith Design Definitions
//!
//! This crate contains reference designs that use the primitives from
//! `modelsmith-define`. Each design is organized in its own module.
//!
//! ## Available Designs
//!
//! - [`cellar`] - A wine cellar with accounts, bottles, a small blog and
//!   widgets, covering every storage and view option
//!
//! ## Examples
//!
//! ```
//! use modelsmith_definitions::cellar::define_cellar_api;
//!
//! let api = define_cellar_api();
//! assert_eq!(api.name, "cellar");
//! assert_eq!(api.versions.len(), 2);
//! ```

pub mod cellar;
pub mod prelude;

use modelsmith_define::ApiDefinition;

pub use cellar::define_cellar_api;

/// Names accepted by [`design_by_name`].
pub const DESIGNS: &[&str] = &["cellar"];

/// Looks up a reference design by name.
///
/// ## Examples
///
/// ```
/// use modelsmith_definitions::design_by_name;
///
/// assert!(design_by_name("cellar").is_some());
/// assert!(design_by_name("unknown").is_none());
/// ```
pub fn design_by_name(name: &str) -> Option<ApiDefinition> {
    match name {
        "cellar" => Some(define_cellar_api()),
        _ => None,
    }
}
