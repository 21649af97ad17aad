//! Errors raised while sending a response.

use thiserror::Error;

use super::FieldErrors;

#[derive(Debug, Error)]
pub enum ResponseError {
    /// The value failed validation before it was rendered.
    #[error("response value is invalid: {0}")]
    Invalid(#[from] FieldErrors),

    /// The rendered value could not be serialized.
    #[error("failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A response was already sent for this request.
    #[error("response already sent with status {0}")]
    AlreadySent(u16),
}
