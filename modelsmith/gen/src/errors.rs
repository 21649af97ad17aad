//! Error types for the modelsmith generator.

use thiserror::Error;

/// Errors that can occur during code generation.
///
/// Every variant is fatal to the generation pass: once one artifact fails,
/// nothing is written.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The design is absent or malformed.
    #[error("Missing or malformed design input: {0}")]
    MissingDesignInput(String),

    /// A type/attribute combination the generator cannot render.
    ///
    /// Raised for object kinds reaching the scalar coercion path and for
    /// arrays whose elements are arrays or objects.
    #[error("Unsupported composite shape for '{name}': {reason}")]
    UnsupportedCompositeShape {
        /// The attribute or parameter name.
        name: String,
        /// What made the shape unsupported.
        reason: String,
    },

    /// Failed to generate code
    #[error("Code generation failed: {0}")]
    CodeGenError(String),

    /// Two artifacts claimed the same output path.
    #[error("Artifact '{0}' was produced more than once")]
    DuplicateArtifact(String),

    /// Failed to write output file
    #[error("Failed to write output file '{path}': {source}")]
    WriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl GeneratorError {
    pub fn unsupported_shape(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedCompositeShape {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn design(message: impl Into<String>) -> Self {
        Self::MissingDesignInput(message.into())
    }
}
