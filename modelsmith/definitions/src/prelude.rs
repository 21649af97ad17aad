//! Convenient re-exports for working with reference designs.
//!
//! ## Examples
//!
//! ```
//! use modelsmith_definitions::prelude::*;
//!
//! let api = define_cellar_api();
//! assert!(api.default_version().is_some());
//! ```

pub use crate::cellar::define_cellar_api;
pub use crate::{DESIGNS, design_by_name};
