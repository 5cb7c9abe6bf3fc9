//! Error types for aggregation runs.

use aggregate_common::ModelError;
use regrid::RegridError;
use stage_pipeline::StageError;
use thiserror::Error;

/// Errors that can occur while running an aggregation task.
///
/// Every error is fatal to the task.
#[derive(Error, Debug)]
pub enum AggregationError {
    /// Inconsistent product, task or collaborator configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// An operator variable is not present in its input dataset.
    #[error("variable '{variable}' not found in input '{input_id}'")]
    UnresolvableVariable { input_id: String, variable: String },

    /// Zone summaries were requested without a zone lookup.
    #[error("zone summaries require a zone lookup")]
    MissingZoneMap,

    /// Site summaries were requested without a site map.
    #[error("site summaries require a site map")]
    MissingSiteMap,

    /// An operator produced a different number of results than it has
    /// output variables.
    #[error("operator '{operator}' produced {actual} result arrays for {expected} output variables")]
    OutputVariableCount {
        operator: String,
        expected: usize,
        actual: usize,
    },

    /// Error reported by an input or output collaborator.
    #[error("data source error: {0}")]
    DataSource(String),

    /// Data does not match the shape described by its metadata.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error(transparent)]
    Stage(#[from] StageError),

    #[error(transparent)]
    Regrid(#[from] RegridError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl AggregationError {
    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a DataSource error.
    pub fn data_source(msg: impl Into<String>) -> Self {
        Self::DataSource(msg.into())
    }

    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }

    /// Whether the error comes from configuration rather than data.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::UnresolvableVariable { .. }
                | Self::MissingZoneMap
                | Self::MissingSiteMap
                | Self::OutputVariableCount { .. }
                | Self::Stage(_)
                | Self::Model(_)
        )
    }
}

/// Result type for aggregation operations.
pub type Result<T> = std::result::Result<T, AggregationError>;
