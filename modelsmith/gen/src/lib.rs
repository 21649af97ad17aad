//! Modelsmith code generator library.
//!
//! This crate turns designs created with `modelsmith-define` into a Rust
//! crate that links against the `modelsmith` runtime. The generated code
//! includes:
//!
//! - A request context per action, decoding and validating path and query
//!   parameters, headers and payload
//! - Response senders on each context, rendering media types through their
//!   views
//! - Media type and user type structs with `decode`, `load` and `validate`
//! - Href factories for resources with a canonical action
//! - A storage model per stored type, with a data-access object that lists,
//!   fetches, adds, updates and deletes rows, optionally through a cache
//!
//! ## Modules
//!
//! - [`codegen`] - Renderers for each part of the generated crate
//! - [`generator`] - The generation driver, planning and rendering artifacts
//! - [`output`] - Validation, formatting, bundling and file writing
//! - [`validation`] - Design checks run before any renderer
//! - [`cargo_gen`] - Cargo.toml generation for the output package
//! - [`config`] - Generator settings, loadable from TOML
//! - [`naming`] - Case conversion and identifier helpers
//! - [`parser`] - Route path parameter utilities
//! - [`errors`] - Error types for the generator
//!
//! ## Example Usage
//!
//! ```no_run
//! use modelsmith_definitions::define_cellar_api;
//! use modelsmith_gen::config::GeneratorConfig;
//! use modelsmith_gen::generator::Generator;
//!
//! let api = define_cellar_api();
//! let generator = Generator::new(GeneratorConfig::default());
//!
//! // dry_run=true prints every file instead of writing it
//! let artifacts = generator.generate_and_write(&api, true).unwrap();
//! println!("{} files", artifacts.len());
//! ```
//!
//! ## Generated Code Structure
//!
//! For a design with an unversioned surface, a `v1` version and a stored
//! `Bottle`:
//!
//! ```text
//! lib.rs               pub mod app; pub mod v1; pub mod models;
//! app/mod.rs           pub use contexts::*; pub use media_types::*; ...
//! app/contexts.rs      pub struct ShowBottleContext { ... }
//! app/media_types.rs   pub struct Bottle { ... }  pub enum BottleView { ... }
//! app/user_types.rs    payloads and non-media user types
//! app/hrefs.rs         pub fn bottle_href(...) -> String
//! v1/...               the same files for version v1
//! models/bottle.rs     pub struct Bottle  pub trait BottleStorage  pub struct BottleDb
//! ```

pub mod cargo_gen;
pub mod codegen;
pub mod config;
pub mod errors;
pub mod generator;
pub mod naming;
pub mod output;
pub mod parser;
pub mod validation;

#[cfg(test)]
mod test_utils;
