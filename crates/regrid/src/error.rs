//! Error types for regular grid mapping.

use thiserror::Error;

/// Errors that can occur while building, persisting or applying a mapper.
#[derive(Error, Debug)]
pub enum RegridError {
    /// Storage/IO error while reading or writing a cache file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The cache file was written by an incompatible version.
    #[error("unsupported mapper cache version: {0}")]
    UnsupportedVersion(f64),

    /// The curvilinear grid cannot be mapped.
    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    /// Data does not match the shape it was described with.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A count field in a cache file is negative.
    #[error("negative {field} in mapper cache: {value}")]
    NegativeCount { field: &'static str, value: i32 },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl RegridError {
    /// Create an InvalidGrid error.
    pub fn invalid_grid(msg: impl Into<String>) -> Self {
        Self::InvalidGrid(msg.into())
    }

    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }

    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type for regrid operations.
pub type Result<T> = std::result::Result<T, RegridError>;
