//! Collaborator interfaces.
//!
//! Reading input files, writing gridded output and formatting summary
//! statistics are implemented outside this crate; the orchestrator only
//! talks to them through these traits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AggregationError, Result};
use crate::summary::{DepthBucket, SummaryStatistics};

/// Tolerance when matching selected depths against dataset depths.
const DEPTH_TOLERANCE: f64 = 1e-6;

/// Storage type of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Float32,
    Float64,
}

/// Shape and layout of a variable in an input dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableMetadata {
    pub name: String,
    pub data_type: DataType,
    /// Full shape, including the time dimension
    pub shape: Vec<usize>,
    /// Position of the time dimension in `shape`
    pub time_dimension: Option<usize>,
    /// Position of the depth dimension in `shape`
    pub depth_dimension: Option<usize>,
}

impl VariableMetadata {
    pub fn has_depth(&self) -> bool {
        self.depth_dimension.is_some()
    }

    /// `(rows, cols)` of the horizontal grid: the last two dimensions.
    pub fn grid_shape(&self) -> Result<(usize, usize)> {
        match self.shape.as_slice() {
            [.., rows, cols] => Ok((*rows, *cols)),
            _ => Err(AggregationError::shape_mismatch(format!(
                "variable '{}' has fewer than 2 dimensions: {:?}",
                self.name, self.shape
            ))),
        }
    }
}

/// An open input file.
pub trait InputDataset {
    /// Metadata of a variable, `None` if the dataset does not hold it.
    fn variable(&self, name: &str) -> Option<VariableMetadata>;

    /// Depth values of the dataset, empty without a depth dimension.
    fn depths(&self) -> Vec<f64>;

    /// Indices of the selected depth values.
    fn depth_indices(&self, selected: &[f64]) -> Result<Vec<usize>> {
        let depths = self.depths();
        selected
            .iter()
            .map(|&depth| {
                depths
                    .iter()
                    .position(|&d| (d - depth).abs() <= DEPTH_TOLERANCE)
                    .ok_or_else(|| {
                        AggregationError::config(format!(
                            "depth {} is not available (dataset depths: {:?})",
                            depth, depths
                        ))
                    })
            })
            .collect()
    }

    /// Time of the slice at `index`.
    fn time_at(&self, index: usize) -> Result<DateTime<Utc>>;

    /// Read one time slice of a variable, restricted to the given depth
    /// indices, as a flat `[depth][row][col]` array. `depth_indices` is empty
    /// for variables without depth.
    fn read_single_time_slice(
        &self,
        variable: &str,
        time_index: usize,
        depth_indices: &[usize],
    ) -> Result<Vec<f64>>;
}

/// Access to input files by id.
pub trait InputDatasetCache {
    /// Open the file with the given id.
    fn retrieve(&mut self, file_id: &str) -> Result<Box<dyn InputDataset>>;

    /// A dataset representative of the input, used to read metadata.
    fn reference_dataset(&mut self, input_id: &str) -> Result<Box<dyn InputDataset>>;
}

/// The gridded output file.
pub trait OutputDataset {
    /// Write `data` with `shape` into `variable` at `offset`.
    fn write(&mut self, variable: &str, offset: &[usize], shape: &[usize], data: &[f64])
        -> Result<()>;
}

/// Accumulates samples per depth and zone or site.
pub trait SummaryAccumulator {
    /// Add one time slice. Only the first array is sampled.
    fn add(&mut self, arrays: &[Vec<f64>]) -> Result<()>;

    /// Drop all samples.
    fn reset(&mut self);

    /// Samples per depth layer of the chunk.
    fn buckets(&self) -> &[DepthBucket];
}

/// Destination of summary statistics.
pub trait OutputWriter {
    fn write(
        &mut self,
        timestamp: DateTime<Utc>,
        operator: &str,
        depth: Option<f64>,
        zone_or_site_id: &str,
        statistics: &SummaryStatistics,
    ) -> Result<()>;
}
