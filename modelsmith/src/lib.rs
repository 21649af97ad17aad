//! Runtime support for code generated by `modelsmith-gen`.
//!
//! Generated contexts, media types and storage models link against this
//! crate. It provides:
//!
//! - **Errors**: [`FieldError`] and its aggregate [`FieldErrors`],
//!   [`ContextError`], [`ResponseError`] and [`StoreError`]
//! - **Requests**: the [`RequestAccessor`] capability plus an in-memory
//!   [`MemoryRequest`]
//! - **Coercion and validation**: [`coerce`] for raw text, [`decode`] for
//!   JSON values, [`validate`] for declared rules
//! - **Storage**: the [`Store`] trait, its query model and a [`MemoryStore`]
//! - **Caching**: an expiring [`Cache`] and the [`detach`] helper used for
//!   fire-and-forget cache updates
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use modelsmith::MemoryStore;
//! use cellar::models::widget::{WidgetDb, WidgetStorage};
//!
//! let db = WidgetDb::new(Arc::new(MemoryStore::new()));
//! let widget = db.one(7).await?;
//! ```

pub mod cache;
pub mod coerce;
pub mod context;
pub mod decode;
pub mod error;
pub mod render;
pub mod roler;
pub mod store;
pub mod task;
pub mod validate;

pub use cache::Cache;
pub use context::{MemoryRequest, RequestAccessor, SentResponse};
pub use error::{ContextError, FieldError, FieldErrors, Location, ResponseError, StoreError};
pub use roler::Roler;
pub use store::{
    Association, Lookup, MemoryStore, Query, Row, ScopeFn, Store, from_row, to_row, without_nulls,
};
pub use task::detach;
