//! Storage collaborator errors.

use thiserror::Error;

/// Errors returned by a [`Store`](crate::store::Store) or by a generated
/// data-access object.
///
/// Generated code passes these through to its caller untouched; a failed
/// write never triggers the dependent cache update.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row matched the lookup.
    #[error("record not found in '{table}'")]
    NotFound { table: String },

    /// The backend rejected or failed the operation.
    #[error("storage operation '{operation}' on '{table}' failed: {reason}")]
    Operation {
        operation: String,
        table: String,
        reason: String,
    },

    /// The backend cannot evaluate a query shape.
    #[error("unsupported query clause: {0}")]
    UnsupportedClause(String),

    /// A row could not be converted to or from its model.
    #[error("row conversion failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(table: impl Into<String>) -> Self {
        Self::NotFound {
            table: table.into(),
        }
    }

    pub fn operation(
        operation: impl Into<String>,
        table: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Operation {
            operation: operation.into(),
            table: table.into(),
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
