//! Error types for the stage pipeline.
//!
//! Every variant is a configuration error: numeric edge cases such as NaN
//! cells are handled in the operators and never surface here.

use thiserror::Error;

/// Errors that can occur while executing a stage.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StageError {
    /// A stage was executed with no input arrays.
    #[error("{stage} executed with no input arrays")]
    NoInputs { stage: &'static str },

    /// A fixed-arity stage received the wrong number of arrays.
    #[error("{stage} expects {expected} input arrays, got {actual}")]
    InputCount {
        stage: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Input arrays that must line up cell-for-cell have different lengths.
    #[error("{stage} input arrays differ in length ({left} != {right})")]
    LengthMismatch {
        stage: &'static str,
        left: usize,
        right: usize,
    },

    /// The difference collector recorded an odd number of arrays.
    #[error("difference needs an even number of arrays, got {0}")]
    OddArrayCount(usize),

    /// A zone resolvable by the zone lookup has no threshold value.
    #[error("no threshold configured for zone '{0}'")]
    MissingThreshold(String),

    /// Per-zone thresholds were configured without a zone lookup.
    #[error("per-zone thresholds require a zone lookup")]
    MissingZoneLookup,

    /// Invalid stage parameter (window size, divisor, ...).
    #[error("invalid stage configuration: {0}")]
    InvalidConfig(String),
}

impl StageError {
    /// Create an InvalidConfig error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// Result type for stage operations.
pub type Result<T> = std::result::Result<T, StageError>;
