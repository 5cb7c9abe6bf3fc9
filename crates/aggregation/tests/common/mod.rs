//! In-memory collaborators for orchestrator tests.

#![allow(dead_code)]

use std::collections::HashMap;

use aggregation::{
    AggregationError, DataType, InputDataset, InputDatasetCache, OutputDataset, OutputWriter,
    Result, SummaryStatistics, VariableMetadata,
};
use chrono::{DateTime, Utc};

/// One variable held in memory, one flat `[depth][row][col]` array per slice.
#[derive(Debug, Clone)]
pub struct InMemoryVariable {
    pub metadata: VariableMetadata,
    pub slices: Vec<Vec<f64>>,
}

/// A dataset held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataset {
    pub times: Vec<DateTime<Utc>>,
    pub depths: Vec<f64>,
    pub rows: usize,
    pub cols: usize,
    pub variables: HashMap<String, InMemoryVariable>,
}

impl InMemoryDataset {
    pub fn new(rows: usize, cols: usize, depths: &[f64]) -> Self {
        Self {
            rows,
            cols,
            depths: depths.to_vec(),
            ..Self::default()
        }
    }

    /// Add a variable whose slices are taken at `times`.
    pub fn with_variable(mut self, name: &str, times: &[DateTime<Utc>], slices: Vec<Vec<f64>>) -> Self {
        let mut shape = vec![slices.len()];
        let depth_dimension = if self.depths.is_empty() {
            None
        } else {
            shape.push(self.depths.len());
            Some(1)
        };
        shape.push(self.rows);
        shape.push(self.cols);

        self.times = times.to_vec();
        self.variables.insert(
            name.to_string(),
            InMemoryVariable {
                metadata: VariableMetadata {
                    name: name.to_string(),
                    data_type: DataType::Float32,
                    shape,
                    time_dimension: Some(0),
                    depth_dimension,
                },
                slices,
            },
        );
        self
    }

    fn layer_cells(&self) -> usize {
        self.rows * self.cols
    }
}

impl InputDataset for InMemoryDataset {
    fn variable(&self, name: &str) -> Option<VariableMetadata> {
        self.variables.get(name).map(|v| v.metadata.clone())
    }

    fn depths(&self) -> Vec<f64> {
        self.depths.clone()
    }

    fn time_at(&self, index: usize) -> Result<DateTime<Utc>> {
        self.times
            .get(index)
            .copied()
            .ok_or_else(|| AggregationError::data_source(format!("no time at index {}", index)))
    }

    fn read_single_time_slice(
        &self,
        variable: &str,
        time_index: usize,
        depth_indices: &[usize],
    ) -> Result<Vec<f64>> {
        let slice = self
            .variables
            .get(variable)
            .and_then(|v| v.slices.get(time_index))
            .ok_or_else(|| {
                AggregationError::data_source(format!("no slice {} of '{}'", time_index, variable))
            })?;
        if depth_indices.is_empty() {
            return Ok(slice.clone());
        }
        let layer_cells = self.layer_cells();
        let mut out = Vec::with_capacity(depth_indices.len() * layer_cells);
        for &depth in depth_indices {
            let start = depth * layer_cells;
            out.extend_from_slice(&slice[start..start + layer_cells]);
        }
        Ok(out)
    }
}

/// Datasets by file id, with one reference file per input.
#[derive(Debug, Default)]
pub struct InMemoryDatasetCache {
    pub files: HashMap<String, InMemoryDataset>,
    pub references: HashMap<String, String>,
    pub retrievals: Vec<String>,
}

impl InMemoryDatasetCache {
    pub fn with_file(mut self, input_id: &str, file_id: &str, dataset: InMemoryDataset) -> Self {
        self.references
            .entry(input_id.to_string())
            .or_insert_with(|| file_id.to_string());
        self.files.insert(file_id.to_string(), dataset);
        self
    }
}

impl InputDatasetCache for InMemoryDatasetCache {
    fn retrieve(&mut self, file_id: &str) -> Result<Box<dyn InputDataset>> {
        self.retrievals.push(file_id.to_string());
        let dataset = self
            .files
            .get(file_id)
            .cloned()
            .ok_or_else(|| AggregationError::data_source(format!("unknown file '{}'", file_id)))?;
        Ok(Box::new(dataset))
    }

    fn reference_dataset(&mut self, input_id: &str) -> Result<Box<dyn InputDataset>> {
        let file_id = self
            .references
            .get(input_id)
            .cloned()
            .ok_or_else(|| AggregationError::data_source(format!("unknown input '{}'", input_id)))?;
        let dataset = self
            .files
            .get(&file_id)
            .cloned()
            .ok_or_else(|| AggregationError::data_source(format!("unknown file '{}'", file_id)))?;
        Ok(Box::new(dataset))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WriteRecord {
    pub variable: String,
    pub offset: Vec<usize>,
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

/// Records every write to the gridded output.
#[derive(Debug, Default)]
pub struct RecordingOutputDataset {
    pub writes: Vec<WriteRecord>,
}

impl OutputDataset for RecordingOutputDataset {
    fn write(&mut self, variable: &str, offset: &[usize], shape: &[usize], data: &[f64]) -> Result<()> {
        self.writes.push(WriteRecord {
            variable: variable.to_string(),
            offset: offset.to_vec(),
            shape: shape.to_vec(),
            data: data.to_vec(),
        });
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRecord {
    pub timestamp: DateTime<Utc>,
    pub operator: String,
    pub depth: Option<f64>,
    pub id: String,
    pub statistics: SummaryStatistics,
}

/// Records every summary row.
#[derive(Debug, Default)]
pub struct RecordingOutputWriter {
    pub records: Vec<SummaryRecord>,
}

impl RecordingOutputWriter {
    pub fn find(&self, depth: Option<f64>, id: &str) -> Option<&SummaryRecord> {
        self.records
            .iter()
            .find(|record| record.depth == depth && record.id == id)
    }
}

impl OutputWriter for RecordingOutputWriter {
    fn write(
        &mut self,
        timestamp: DateTime<Utc>,
        operator: &str,
        depth: Option<f64>,
        zone_or_site_id: &str,
        statistics: &SummaryStatistics,
    ) -> Result<()> {
        self.records.push(SummaryRecord {
            timestamp,
            operator: operator.to_string(),
            depth,
            id: zone_or_site_id.to_string(),
            statistics: *statistics,
        });
        Ok(())
    }
}
