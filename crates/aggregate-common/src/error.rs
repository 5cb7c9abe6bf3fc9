//! Error types for task and product definitions.

use thiserror::Error;

/// Result type alias using ModelError.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while loading or validating definitions.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Malformed variable name '{0}', expected 'inputId::variableName'")]
    MalformedVariableName(String),

    #[error("Invalid file index bounds for '{file_id}': start {start} > end {end}")]
    InvalidBounds {
        file_id: String,
        start: usize,
        end: usize,
    },

    #[error("Invalid definition: {0}")]
    Invalid(String),

    #[error("Failed to parse YAML definition: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON definition: {0}")]
    Json(#[from] serde_json::Error),
}

impl ModelError {
    /// Create an Invalid error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}
