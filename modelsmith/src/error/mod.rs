//! Error types shared by generated code.
//!
//! - [`FieldError`] / [`FieldErrors`] - coercion and validation failures
//! - [`ContextError`] - failure of a generated context constructor
//! - [`ResponseError`] - failure while rendering or sending a response
//! - [`StoreError`] - storage failures passed through data-access objects

mod context_error;
mod field_error;
mod response_error;
mod store_error;

pub use context_error::ContextError;
pub use field_error::{FieldError, FieldErrors, Location};
pub use response_error::ResponseError;
pub use store_error::StoreError;
