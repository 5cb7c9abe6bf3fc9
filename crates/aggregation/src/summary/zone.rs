use std::sync::Arc;

use stage_pipeline::ZoneLookup;
use tracing::debug;

use super::{empty_buckets, first_array, DepthBucket};
use crate::error::{AggregationError, Result};
use crate::io::SummaryAccumulator;

/// Samples every cell into the bucket of its zone.
#[derive(Debug)]
pub struct ZoneAccumulator {
    zones: Arc<ZoneLookup>,
    layer_cells: usize,
    buckets: Vec<DepthBucket>,
}

impl ZoneAccumulator {
    /// Accumulator for one depth chunk. `depths` is empty for variables
    /// without depth.
    pub fn new(zones: Arc<ZoneLookup>, layer_cells: usize, depths: &[f64]) -> Result<Self> {
        if zones.zone_count() == 0 {
            return Err(AggregationError::config("zone lookup assigns no cell to a zone"));
        }
        if let Some(zone_cells) = zones.layer_cells() {
            if zone_cells != layer_cells {
                return Err(AggregationError::config(format!(
                    "zone lookup covers {} cells, grid layer has {}",
                    zone_cells, layer_cells
                )));
            }
        }
        debug!(
            zones = zones.zone_count(),
            layer_cells,
            depths = depths.len(),
            "Created zone accumulator"
        );
        Ok(Self {
            zones,
            layer_cells,
            buckets: empty_buckets(depths),
        })
    }
}

impl SummaryAccumulator for ZoneAccumulator {
    fn add(&mut self, arrays: &[Vec<f64>]) -> Result<()> {
        let array = first_array(arrays, self.buckets.len(), self.layer_cells)?;
        for (bucket, layer) in self.buckets.iter_mut().zip(array.chunks(self.layer_cells.max(1))) {
            for (cell, &value) in layer.iter().enumerate() {
                if let Some(zone) = self.zones.zone_id_of(cell) {
                    bucket.push(zone, value);
                }
            }
        }
        Ok(())
    }

    fn reset(&mut self) {
        for bucket in &mut self.buckets {
            bucket.samples.clear();
        }
    }

    fn buckets(&self) -> &[DepthBucket] {
        &self.buckets
    }
}
