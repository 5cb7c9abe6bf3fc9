//! Temporal aggregation of one operator over one depth chunk.

use std::sync::Arc;

use aggregate_common::SummaryOperator;
use chrono::{DateTime, Utc};
use stage_pipeline::{build_pipeline, Pipeline, ZoneLookup};
use tracing::trace;

use crate::error::Result;

/// Feeds time slices into the stage pipeline of an operator.
#[derive(Debug)]
pub struct Aggregator {
    pipeline: Pipeline,
    slices: usize,
    first_time: Option<DateTime<Utc>>,
    last_time: Option<DateTime<Utc>>,
}

impl Aggregator {
    pub fn new(operator: &SummaryOperator, zones: Option<Arc<ZoneLookup>>) -> Result<Self> {
        Ok(Self {
            pipeline: build_pipeline(operator, zones)?,
            slices: 0,
            first_time: None,
            last_time: None,
        })
    }

    /// Add the arrays of one time slice, one per operator variable.
    pub fn add(&mut self, time: DateTime<Utc>, arrays: &[Vec<f64>]) -> Result<()> {
        trace!(time = %time, arrays = arrays.len(), "Adding time slice");
        self.pipeline.execute(arrays)?;
        self.slices += 1;
        self.first_time.get_or_insert(time);
        self.last_time = Some(time);
        Ok(())
    }

    /// Aggregated arrays, `None` before the first slice.
    pub fn results(&self) -> Result<Option<Vec<Vec<f64>>>> {
        Ok(self.pipeline.results()?)
    }

    pub fn reset(&mut self) {
        self.pipeline.reset();
        self.slices = 0;
        self.first_time = None;
        self.last_time = None;
    }

    /// Slices added since the last reset.
    pub fn slice_count(&self) -> usize {
        self.slices
    }

    /// Times of the first and last slice added.
    pub fn time_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.first_time.zip(self.last_time)
    }
}
