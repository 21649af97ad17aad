//! The cellar design, generated by `modelsmith-gen`.
//!
//! The build script renders the design from `modelsmith-definitions` and
//! bundles every generated file into one module tree:
//!
//! - [`app`] - contexts, media types and payloads of the unversioned surface
//! - [`v1`] - the same for version `v1`
//! - [`models`] - storage models and their data-access objects
//!
//! ## Examples
//!
//! ```
//! use modelsmith::MemoryRequest;
//! use modelsmith_schema::app::ShowAccountContext;
//!
//! let request = MemoryRequest::new().with_param("accountID", "7").boxed();
//! let context = ShowAccountContext::new(request).unwrap();
//! assert_eq!(context.account_id, 7);
//! ```

include!(concat!(env!("OUT_DIR"), "/cellar.rs"));
