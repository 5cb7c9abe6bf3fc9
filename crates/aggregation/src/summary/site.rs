use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{empty_buckets, first_array, DepthBucket};
use crate::error::{AggregationError, Result};
use crate::io::SummaryAccumulator;

/// A named location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Grid cell sampled for each site.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteMap {
    cells: BTreeMap<String, usize>,
    layer_cells: usize,
}

impl SiteMap {
    /// Map sites to explicit cell indices of a layer of `layer_cells` cells.
    pub fn from_cells(cells: BTreeMap<String, usize>, layer_cells: usize) -> Result<Self> {
        if let Some((id, &cell)) = cells.iter().find(|(_, cell)| **cell >= layer_cells) {
            return Err(AggregationError::config(format!(
                "site '{}' maps to cell {} outside a layer of {} cells",
                id, cell, layer_cells
            )));
        }
        Ok(Self { cells, layer_cells })
    }

    /// Map each site to the nearest grid cell with valid coordinates.
    pub fn nearest_cells(sites: &[Site], latitude: &[f64], longitude: &[f64]) -> Result<Self> {
        if latitude.len() != longitude.len() {
            return Err(AggregationError::shape_mismatch(format!(
                "latitude has {} cells, longitude has {}",
                latitude.len(),
                longitude.len()
            )));
        }

        let mut cells = BTreeMap::new();
        for site in sites {
            let nearest = latitude
                .iter()
                .zip(longitude)
                .enumerate()
                .filter(|(_, (lat, lon))| !lat.is_nan() && !lon.is_nan())
                .map(|(index, (lat, lon))| {
                    let d_lat = lat - site.latitude;
                    let d_lon = lon - site.longitude;
                    (index, d_lat * d_lat + d_lon * d_lon)
                })
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(index, _)| index)
                .ok_or_else(|| AggregationError::config("grid has no valid coordinates"))?;
            cells.insert(site.id.clone(), nearest);
        }

        Ok(Self {
            cells,
            layer_cells: latitude.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn layer_cells(&self) -> usize {
        self.layer_cells
    }

    pub fn cell_of(&self, site_id: &str) -> Option<usize> {
        self.cells.get(site_id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.cells.iter().map(|(id, &cell)| (id.as_str(), cell))
    }
}

/// Samples the cell of each site.
#[derive(Debug)]
pub struct SiteAccumulator {
    sites: Arc<SiteMap>,
    buckets: Vec<DepthBucket>,
}

impl SiteAccumulator {
    /// Accumulator for one depth chunk. `depths` is empty for variables
    /// without depth.
    pub fn new(sites: Arc<SiteMap>, layer_cells: usize, depths: &[f64]) -> Result<Self> {
        if sites.is_empty() {
            return Err(AggregationError::config("site map has no sites"));
        }
        if sites.layer_cells() != layer_cells {
            return Err(AggregationError::config(format!(
                "site map covers {} cells, grid layer has {}",
                sites.layer_cells(),
                layer_cells
            )));
        }
        debug!(sites = sites.len(), depths = depths.len(), "Created site accumulator");
        Ok(Self {
            sites,
            buckets: empty_buckets(depths),
        })
    }
}

impl SummaryAccumulator for SiteAccumulator {
    fn add(&mut self, arrays: &[Vec<f64>]) -> Result<()> {
        let layer_cells = self.sites.layer_cells();
        let array = first_array(arrays, self.buckets.len(), layer_cells)?;
        for (bucket, layer) in self.buckets.iter_mut().zip(array.chunks(layer_cells.max(1))) {
            for (id, cell) in self.sites.iter() {
                bucket.push(id, layer[cell]);
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
