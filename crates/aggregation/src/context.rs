//! State shared by the stages of one aggregation run.

use std::sync::Arc;

use aggregate_common::{Input, ProductDefinition, SummaryOperator, Task, TimeInstant};
use regrid::RegularGridMapper;
use stage_pipeline::ZoneLookup;

use crate::config::AggregationConfig;
use crate::error::{AggregationError, Result};
use crate::io::{InputDatasetCache, OutputDataset, OutputWriter};
use crate::summary::SiteMap;

/// Where the run currently is: the task and product plus the time instant,
/// operator and inputs being processed.
#[derive(Debug)]
pub struct PipelineContext<'a> {
    pub task: &'a Task,
    pub product: &'a ProductDefinition,
    pub config: &'a AggregationConfig,
    pub time_instant: Option<&'a TimeInstant>,
    /// Index of `time_instant` in the task, used as the output time offset
    pub time_index: usize,
    pub operator: Option<&'a SummaryOperator>,
    pub inputs: Vec<&'a Input>,
    /// Whether a gridded output file is populated
    pub write_grid_file: bool,
}

impl<'a> PipelineContext<'a> {
    pub fn new(
        task: &'a Task,
        product: &'a ProductDefinition,
        config: &'a AggregationConfig,
        write_grid_file: bool,
    ) -> Self {
        Self {
            task,
            product,
            config,
            time_instant: None,
            time_index: 0,
            operator: None,
            inputs: Vec::new(),
            write_grid_file,
        }
    }

    pub fn time_instant(&self) -> Result<&'a TimeInstant> {
        self.time_instant
            .ok_or_else(|| AggregationError::config("no current time instant"))
    }

    pub fn operator(&self) -> Result<&'a SummaryOperator> {
        self.operator
            .ok_or_else(|| AggregationError::config("no current operator"))
    }
}

/// External collaborators of a run.
pub struct Collaborators<'c> {
    pub datasets: &'c mut dyn InputDatasetCache,
    pub output: Option<&'c mut dyn OutputDataset>,
    pub summary_writer: Option<&'c mut dyn OutputWriter>,
    pub mapper: Option<&'c RegularGridMapper>,
    pub zones: Option<Arc<ZoneLookup>>,
    pub sites: Option<Arc<SiteMap>>,
}

impl<'c> Collaborators<'c> {
    pub fn new(datasets: &'c mut dyn InputDatasetCache) -> Self {
        Self {
            datasets,
            output: None,
            summary_writer: None,
            mapper: None,
            zones: None,
            sites: None,
        }
    }

    pub fn with_output(mut self, output: &'c mut dyn OutputDataset) -> Self {
        self.output = Some(output);
        self
    }

    pub fn with_summary_writer(mut self, writer: &'c mut dyn OutputWriter) -> Self {
        self.summary_writer = Some(writer);
        self
    }

    pub fn with_mapper(mut self, mapper: &'c RegularGridMapper) -> Self {
        self.mapper = Some(mapper);
        self
    }

    pub fn with_zones(mut self, zones: Arc<ZoneLookup>) -> Self {
        self.zones = Some(zones);
        self
    }

    pub fn with_sites(mut self, sites: Arc<SiteMap>) -> Self {
        self.sites = Some(sites);
        self
    }
}

/// Aggregated arrays of one depth chunk on their way to the output.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkOutput {
    pub arrays: Vec<Vec<f64>>,
    /// `[1, depths, rows, cols]`, or `[1, rows, cols]` without depth
    pub shape: Vec<usize>,
    /// Position of the chunk's first depth among the selected depths
    pub depth_offset: usize,
    pub has_depth: bool,
}
