//! Errors returned by generated context constructors.

use std::fmt::Debug;

use thiserror::Error;

use super::FieldErrors;

/// Failure of a generated `Context::new`.
///
/// Parameter and header problems are collected: the partially built context
/// travels inside [`ContextError::Invalid`] so callers can still inspect the
/// fields that did coerce. A bad payload aborts construction and carries no
/// context.
#[derive(Debug, Error)]
pub enum ContextError<C: Debug> {
    #[error("invalid request: {errors}")]
    Invalid { context: Box<C>, errors: FieldErrors },

    #[error("invalid payload: {0}")]
    Payload(FieldErrors),
}

impl<C: Debug> ContextError<C> {
    /// Returns the accumulated field errors.
    pub fn errors(&self) -> &FieldErrors {
        match self {
            Self::Invalid { errors, .. } | Self::Payload(errors) => errors,
        }
    }

    /// Returns the partially built context, if any.
    pub fn into_context(self) -> Option<C> {
        match self {
            Self::Invalid { context, .. } => Some(*context),
            Self::Payload(_) => None,
        }
    }
}
