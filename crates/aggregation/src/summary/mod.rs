//! Zone and site summaries.
//!
//! Bucket accumulators sample the per-cell values of each time slice into
//! depth -> zone-or-site -> samples buckets; once a depth chunk of a time
//! instant is complete every bucket is reduced to [`SummaryStatistics`].

mod site;
mod statistics;
mod zone;

pub use site::{Site, SiteAccumulator, SiteMap};
pub use statistics::{percentile, SummaryStatistics};
pub use zone::ZoneAccumulator;

use std::collections::BTreeMap;

use crate::error::{AggregationError, Result};

/// Samples of one depth layer, keyed by zone or site id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DepthBucket {
    /// Depth value, `None` for variables without depth
    pub depth: Option<f64>,
    pub samples: BTreeMap<String, Vec<f64>>,
}

impl DepthBucket {
    pub fn new(depth: Option<f64>) -> Self {
        Self {
            depth,
            samples: BTreeMap::new(),
        }
    }

    fn push(&mut self, id: &str, value: f64) {
        if value.is_nan() {
            return;
        }
        match self.samples.get_mut(id) {
            Some(values) => values.push(value),
            None => {
                self.samples.insert(id.to_string(), vec![value]);
            }
        }
    }
}

/// One bucket per depth of the chunk, or a single depth-less bucket.
fn empty_buckets(depths: &[f64]) -> Vec<DepthBucket> {
    if depths.is_empty() {
        vec![DepthBucket::new(None)]
    } else {
        depths.iter().map(|&d| DepthBucket::new(Some(d))).collect()
    }
}

/// The first array of a slice, checked against the chunk layout.
fn first_array<'a>(arrays: &'a [Vec<f64>], layers: usize, layer_cells: usize) -> Result<&'a [f64]> {
    let array = arrays
        .first()
        .ok_or_else(|| AggregationError::data_source("summary accumulator received no arrays"))?;
    if array.len() != layers * layer_cells {
        return Err(AggregationError::shape_mismatch(format!(
            "expected {} layers of {} cells, got {} values",
            layers,
            layer_cells,
            array.len()
        )));
    }
    Ok(array)
}
