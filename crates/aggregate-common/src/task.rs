//! Task and product definitions.

use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::operator::SummaryOperator;
use crate::time::{AggregationPeriod, TimeIncrement};

/// A contiguous run of time slices within one input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileIndexBounds {
    pub file_id: String,
    /// First time-slice index (inclusive)
    pub start_index: usize,
    /// Last time-slice index (inclusive)
    pub end_index: usize,
}

impl FileIndexBounds {
    pub fn new(file_id: impl Into<String>, start_index: usize, end_index: usize) -> Self {
        Self {
            file_id: file_id.into(),
            start_index,
            end_index,
        }
    }

    /// Time-slice indices covered by these bounds.
    pub fn indices(&self) -> RangeInclusive<usize> {
        self.start_index..=self.end_index
    }

    /// Number of slices, 0 for inverted bounds.
    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.end_index - self.start_index + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start_index > self.end_index
    }
}

/// Slices of one input source contributing to a [`TimeInstant`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    pub input_id: String,
    pub file_bounds: Vec<FileIndexBounds>,
}

impl Input {
    pub fn new(input_id: impl Into<String>, file_bounds: Vec<FileIndexBounds>) -> Self {
        Self {
            input_id: input_id.into(),
            file_bounds,
        }
    }

    /// Total number of time slices across all files.
    pub fn slice_count(&self) -> usize {
        self.file_bounds.iter().map(FileIndexBounds::len).sum()
    }
}

/// One aggregated output time with the inputs that feed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeInstant {
    pub value: DateTime<Utc>,
    pub inputs: Vec<Input>,
}

impl TimeInstant {
    pub fn new(value: DateTime<Utc>, inputs: Vec<Input>) -> Self {
        Self { value, inputs }
    }

    /// Inputs whose id is one of `input_ids`, in the order of `input_ids`.
    pub fn inputs_for<'a>(&'a self, input_ids: &[&str]) -> Vec<&'a Input> {
        input_ids
            .iter()
            .flat_map(|id| self.inputs.iter().filter(move |input| input.input_id == *id))
            .collect()
    }
}

/// A unit of work: the time instants to aggregate for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub product_id: String,
    pub time_instants: Vec<TimeInstant>,
}

impl Task {
    pub fn from_yaml_str(s: &str) -> ModelResult<Self> {
        let task: Task = serde_yaml::from_str(s)?;
        task.validate()?;
        Ok(task)
    }

    pub fn from_json_str(s: &str) -> ModelResult<Self> {
        let task: Task = serde_json::from_str(s)?;
        task.validate()?;
        Ok(task)
    }

    pub fn validate(&self) -> ModelResult<()> {
        for instant in &self.time_instants {
            for input in &instant.inputs {
                for bounds in &input.file_bounds {
                    if bounds.is_empty() {
                        return Err(ModelError::InvalidBounds {
                            file_id: bounds.file_id.clone(),
                            start: bounds.start_index,
                            end: bounds.end_index,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Static metadata about an input source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDefinition {
    pub id: String,
    pub time_increment: TimeIncrement,
}

/// How per-cell results are reduced into summary statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryKind {
    /// Group cells by zone
    Zone,
    /// Sample cells nearest to configured sites
    Site,
}

fn default_true() -> bool {
    true
}

/// Definition of an aggregated product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDefinition {
    pub id: String,
    pub aggregation_period: AggregationPeriod,
    pub inputs: Vec<InputDefinition>,
    pub operators: Vec<SummaryOperator>,
    /// Input whose dataset defines output shape and depths. Falls back to the
    /// input of each operator's first variable.
    #[serde(default)]
    pub reference_input_id: Option<String>,
    /// Selected depths. All depths of the reference dataset when absent.
    #[serde(default)]
    pub depths: Option<Vec<f64>>,
    /// Regular grid resolution in degrees. Output stays on the native grid
    /// when absent.
    #[serde(default)]
    pub regular_grid_resolution: Option<f64>,
    /// Whether a gridded output file is populated.
    #[serde(default = "default_true")]
    pub write_grid_file: bool,
    #[serde(default)]
    pub summary: Option<SummaryKind>,
}

impl ProductDefinition {
    pub fn from_yaml_str(s: &str) -> ModelResult<Self> {
        let product: ProductDefinition = serde_yaml::from_str(s)?;
        product.validate()?;
        Ok(product)
    }

    pub fn from_json_str(s: &str) -> ModelResult<Self> {
        let product: ProductDefinition = serde_json::from_str(s)?;
        product.validate()?;
        Ok(product)
    }

    pub fn input(&self, id: &str) -> Option<&InputDefinition> {
        self.inputs.iter().find(|input| input.id == id)
    }

    pub fn validate(&self) -> ModelResult<()> {
        if self.operators.is_empty() {
            return Err(ModelError::invalid(format!(
                "product '{}' has no operators",
                self.id
            )));
        }

        for operator in &self.operators {
            operator.validate()?;
            for input_id in operator.input_ids() {
                if self.input(input_id).is_none() {
                    return Err(ModelError::invalid(format!(
                        "operator '{}' references unknown input '{}'",
                        operator.name(),
                        input_id
                    )));
                }
            }
        }

        if let Some(reference) = &self.reference_input_id {
            if self.input(reference).is_none() {
                return Err(ModelError::invalid(format!(
                    "reference input '{}' is not defined",
                    reference
                )));
            }
        }

        if let Some(resolution) = self.regular_grid_resolution {
            if !(resolution > 0.0) {
                return Err(ModelError::invalid(format!(
                    "regular grid resolution must be > 0, got {}",
                    resolution
                )));
            }
        }

        if !self.write_grid_file && self.summary.is_none() {
            return Err(ModelError::invalid(format!(
                "product '{}' produces neither a grid file nor a summary",
                self.id
            )));
        }

        Ok(())
    }
}
