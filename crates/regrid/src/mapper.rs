//! Nearest-neighbour mapping from a curvilinear grid to a regular grid.
//!
//! Every regular grid point is linked to at most [`MAX_CANDIDATES`] source
//! cells, found by growing a square search box around the point. Values are
//! reprojected as the inverse-distance weighted mean of those cells.

use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use tracing::{debug, info};

use crate::config::DEFAULT_ZERO_DISTANCE_WEIGHT;
use crate::error::{RegridError, Result};
use crate::index::CoordinateIndex;

/// Maximum number of source cells per regular grid point.
pub const MAX_CANDIDATES: usize = 4;

/// Largest search box half-width, in multiples of half the resolution.
const MAX_SEARCH_STEPS: usize = 6;

/// A source cell and its distance to a regular grid point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexWithDistance {
    /// Flat index into one layer of the curvilinear grid
    pub index: usize,
    /// Euclidean distance in degrees
    pub distance: f64,
}

impl IndexWithDistance {
    pub fn new(index: usize, distance: f64) -> Self {
        Self { index, distance }
    }

    /// Inverse-distance weight, or `zero_distance_weight` for a cell on the
    /// point itself.
    #[inline]
    pub fn weight(&self, zero_distance_weight: f64) -> f64 {
        if self.distance == 0.0 {
            zero_distance_weight
        } else {
            1.0 / self.distance
        }
    }
}

/// Mapping from regular grid points to curvilinear source cells.
#[derive(Debug, Clone, PartialEq)]
pub struct RegularGridMapper {
    lat_axis: Vec<f64>,
    lon_axis: Vec<f64>,
    /// Keyed by (lat index, lon index). Points without candidates are absent.
    mapping: BTreeMap<(usize, usize), Vec<IndexWithDistance>>,
    zero_distance_weight: f64,
}

/// Round to 6 decimal places.
fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

fn axis(min: f64, max: f64, resolution: f64) -> Vec<f64> {
    let count = ((max - min) / resolution).ceil() as usize;
    (0..count)
        .map(|i| round6(min + resolution * i as f64))
        .collect()
}

impl RegularGridMapper {
    /// Assemble a mapper from its parts.
    pub fn from_parts(
        lat_axis: Vec<f64>,
        lon_axis: Vec<f64>,
        mapping: BTreeMap<(usize, usize), Vec<IndexWithDistance>>,
    ) -> Self {
        Self {
            lat_axis,
            lon_axis,
            mapping,
            zero_distance_weight: DEFAULT_ZERO_DISTANCE_WEIGHT,
        }
    }

    /// Build the mapping for a curvilinear grid given as flat latitude and
    /// longitude arrays of equal length.
    pub fn build(latitude: &[f64], longitude: &[f64], resolution: f64) -> Result<Self> {
        if latitude.len() != longitude.len() {
            return Err(RegridError::shape_mismatch(format!(
                "latitude has {} cells, longitude has {}",
                latitude.len(),
                longitude.len()
            )));
        }
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(RegridError::invalid_grid(format!(
                "resolution must be finite and > 0, got {}",
                resolution
            )));
        }

        let start = Instant::now();
        let lat_index = CoordinateIndex::new(latitude);
        let lon_index = CoordinateIndex::new(longitude);

        let (min_lat, max_lat, min_lon, max_lon) = match (
            lat_index.min(),
            lat_index.max(),
            lon_index.min(),
            lon_index.max(),
        ) {
            (Some(a), Some(b), Some(c), Some(d)) => (a, b, c, d),
            _ => return Err(RegridError::invalid_grid("grid has no valid coordinates")),
        };

        let lat_axis = axis(min_lat, max_lat, resolution);
        let lon_axis = axis(min_lon, max_lon, resolution);
        if lat_axis.is_empty() || lon_axis.is_empty() {
            return Err(RegridError::invalid_grid(format!(
                "grid extent lat [{}, {}] lon [{}, {}] is smaller than the resolution {}",
                min_lat, max_lat, min_lon, max_lon, resolution
            )));
        }

        info!(
            cells = latitude.len(),
            lat_count = lat_axis.len(),
            lon_count = lon_axis.len(),
            resolution,
            "Building regular grid mapper"
        );

        let step = resolution / 2.0;
        let mut mapping = BTreeMap::new();
        for (lat_i, &lat) in lat_axis.iter().enumerate() {
            for (lon_i, &lon) in lon_axis.iter().enumerate() {
                let candidates = search_candidates(&lat_index, &lon_index, lat, lon, step);
                let nearest = nearest(&candidates, latitude, longitude, lat, lon);
                if !nearest.is_empty() {
                    mapping.insert((lat_i, lon_i), nearest);
                }
            }
        }

        info!(
            mapped = mapping.len(),
            points = lat_axis.len() * lon_axis.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Built regular grid mapper"
        );

        Ok(Self::from_parts(lat_axis, lon_axis, mapping))
    }

    pub fn with_zero_distance_weight(mut self, weight: f64) -> Self {
        self.zero_distance_weight = weight;
        self
    }

    pub fn zero_distance_weight(&self) -> f64 {
        self.zero_distance_weight
    }

    pub fn lat_axis(&self) -> &[f64] {
        &self.lat_axis
    }

    pub fn lon_axis(&self) -> &[f64] {
        &self.lon_axis
    }

    pub fn lat_count(&self) -> usize {
        self.lat_axis.len()
    }

    pub fn lon_count(&self) -> usize {
        self.lon_axis.len()
    }

    /// Number of regular grid points with at least one candidate.
    pub fn mapped_points(&self) -> usize {
        self.mapping.len()
    }

    /// Candidates of the point at (lat index, lon index), nearest first.
    pub fn candidates(&self, lat_index: usize, lon_index: usize) -> &[IndexWithDistance] {
        self.mapping
            .get(&(lat_index, lon_index))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Mapped points in ascending (lat index, lon index) order.
    pub fn entries(&self) -> impl Iterator<Item = (&(usize, usize), &Vec<IndexWithDistance>)> {
        self.mapping.iter()
    }

    /// Reproject one curvilinear layer onto the regular grid.
    pub fn regrid_layer(&self, layer: &[f64]) -> Result<Vec<f64>> {
        let lon_count = self.lon_count();
        let mut output = vec![f64::NAN; self.lat_count() * lon_count];

        for (&(lat_i, lon_i), candidates) in &self.mapping {
            let mut weighted = 0.0;
            let mut total_weight = 0.0;
            for candidate in candidates {
                let value = *layer.get(candidate.index).ok_or_else(|| {
                    RegridError::shape_mismatch(format!(
                        "candidate cell {} outside layer of {} cells",
                        candidate.index,
                        layer.len()
                    ))
                })?;
                if value.is_nan() {
                    continue;
                }
                let weight = candidate.weight(self.zero_distance_weight);
                weighted += weight * value;
                total_weight += weight;
            }
            if total_weight > 0.0 {
                output[lat_i * lon_count + lon_i] = weighted / total_weight;
            }
        }

        Ok(output)
    }

    /// Reproject an array whose last two dimensions are the curvilinear grid.
    ///
    /// At most one leading dimension (the depth) may be larger than 1. The
    /// output keeps the leading dimensions and replaces the last two with
    /// `[lat_count, lon_count]`.
    pub fn curved_to_regular(&self, data: &[f64], shape: &[usize]) -> Result<(Vec<f64>, Vec<usize>)> {
        if shape.len() < 2 {
            return Err(RegridError::shape_mismatch(format!(
                "expected at least 2 dimensions, got {:?}",
                shape
            )));
        }
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(RegridError::shape_mismatch(format!(
                "data has {} values, shape {:?} needs {}",
                data.len(),
                shape,
                expected
            )));
        }

        let (leading, grid) = shape.split_at(shape.len() - 2);
        if leading.iter().filter(|&&dim| dim > 1).count() > 1 {
            return Err(RegridError::shape_mismatch(format!(
                "only the depth dimension may exceed 1 ahead of the grid, got {:?}",
                shape
            )));
        }

        let layer_len = grid[0] * grid[1];
        let layers: usize = leading.iter().product();
        debug!(layers, layer_len, "Reprojecting onto regular grid");

        let mut output = Vec::with_capacity(layers * self.lat_count() * self.lon_count());
        if layer_len > 0 {
            for layer in data.chunks(layer_len) {
                output.extend(self.regrid_layer(layer)?);
            }
        }

        let mut output_shape = leading.to_vec();
        output_shape.push(self.lat_count());
        output_shape.push(self.lon_count());
        Ok((output, output_shape))
    }
}

/// Grow a square box around (lat, lon) until it holds enough cells.
fn search_candidates(
    lat_index: &CoordinateIndex,
    lon_index: &CoordinateIndex,
    lat: f64,
    lon: f64,
    step: f64,
) -> Vec<usize> {
    let mut candidates = Vec::new();
    for k in 1..=MAX_SEARCH_STEPS {
        let half = step * k as f64;
        // Intersect through the smaller of the two bands.
        let lat_count = lat_index.count_between(lat - half, lat + half);
        let lon_count = lon_index.count_between(lon - half, lon + half);
        candidates = if lat_count <= lon_count {
            let band: HashSet<usize> = lat_index.cells_between(lat - half, lat + half).collect();
            lon_index
                .cells_between(lon - half, lon + half)
                .filter(|cell| band.contains(cell))
                .collect()
        } else {
            let band: HashSet<usize> = lon_index.cells_between(lon - half, lon + half).collect();
            lat_index
                .cells_between(lat - half, lat + half)
                .filter(|cell| band.contains(cell))
                .collect()
        };
        if candidates.len() >= MAX_CANDIDATES {
            break;
        }
    }
    candidates
}

/// The closest candidates, ascending by distance.
fn nearest(
    candidates: &[usize],
    latitude: &[f64],
    longitude: &[f64],
    lat: f64,
    lon: f64,
) -> Vec<IndexWithDistance> {
    let mut nearest: Vec<IndexWithDistance> = candidates
        .iter()
        .map(|&index| {
            let d_lat = latitude[index] - lat;
            let d_lon = longitude[index] - lon;
            IndexWithDistance::new(index, (d_lat * d_lat + d_lon * d_lon).sqrt())
        })
        .collect();
    nearest.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.index.cmp(&b.index)));
    nearest.truncate(MAX_CANDIDATES);
    nearest
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{assert_approx_eq, create_rectilinear_grid, create_two_by_two_grid};

    #[test]
    fn test_axes() {
        let grid = create_two_by_two_grid();
        let mapper = RegularGridMapper::build(&grid.latitude, &grid.longitude, 0.5).unwrap();
        assert_eq!(mapper.lat_axis(), &[-20.0, -19.5]);
        assert_eq!(mapper.lon_axis(), &[145.0, 145.5]);
    }

    #[test]
    fn test_axis_values_are_rounded() {
        let values = axis(0.0, 1.0, 0.1);
        assert_eq!(values.len(), 10);
        assert_eq!(values[3], 0.3);
        assert_eq!(values[7], 0.7);
    }

    #[test]
    fn test_exact_points_use_zero_distance_weight() {
        let grid = create_two_by_two_grid();
        let mapper = RegularGridMapper::build(&grid.latitude, &grid.longitude, 0.5).unwrap();

        let origin = mapper.candidates(0, 0);
        assert_eq!(origin.len(), 4);
        assert_eq!(origin[0], IndexWithDistance::new(0, 0.0));
        assert_eq!(origin[0].weight(999.0), 999.0);
        assert_approx_eq!(origin[1].weight(999.0), 1.0, 1e-12);

        // values 1, 2, 3, 4 at cells 0..4; origin dominated by cell 0
        let out = mapper.regrid_layer(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        let expected = (999.0 * 1.0 + 2.0 + 3.0 + 4.0 / 2f64.sqrt()) / (999.0 + 2.0 + 1.0 / 2f64.sqrt());
        assert_approx_eq!(out[0], expected, 1e-9);
    }

    #[test]
    fn test_nan_candidates_are_skipped() {
        let grid = create_two_by_two_grid();
        let mapper = RegularGridMapper::build(&grid.latitude, &grid.longitude, 0.5).unwrap();
        let out = mapper
            .regrid_layer(&[f64::NAN, 2.0, f64::NAN, f64::NAN])
            .unwrap();
        assert!(out.iter().all(|&v| (v - 2.0).abs() < 1e-12));

        let out = mapper.regrid_layer(&[f64::NAN; 4]).unwrap();
        assert!(out.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_tunable_zero_distance_weight() {
        let grid = create_two_by_two_grid();
        let mapper = RegularGridMapper::build(&grid.latitude, &grid.longitude, 0.5)
            .unwrap()
            .with_zero_distance_weight(1e12);
        let out = mapper.regrid_layer(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_approx_eq!(out[0], 1.0, 1e-9);
    }

    #[test]
    fn test_points_without_candidates_are_nan() {
        // Two clusters far apart leave the middle of the regular grid empty.
        let latitude = vec![0.0, 0.0, 10.0, 10.0];
        let longitude = vec![0.0, 10.0, 0.0, 10.0];
        let mapper = RegularGridMapper::build(&latitude, &longitude, 1.0).unwrap();
        assert_eq!(mapper.lat_count(), 10);
        assert!(mapper.candidates(5, 5).is_empty());
        let out = mapper.regrid_layer(&[1.0, 1.0, 1.0, 1.0]).unwrap();
        assert!(out[5 * 10 + 5].is_nan());
        assert_approx_eq!(out[0], 1.0, 1e-12);
    }

    #[test]
    fn test_curved_to_regular_keeps_depth() {
        let grid = create_rectilinear_grid(2, 2, 0.0, 0.0, 1.0, 1.0);
        let mapper = RegularGridMapper::build(&grid.latitude, &grid.longitude, 0.5).unwrap();
        let data = vec![1.0, 1.0, 1.0, 1.0, 5.0, 5.0, 5.0, 5.0];
        let (out, shape) = mapper.curved_to_regular(&data, &[1, 2, 2, 2]).unwrap();
        assert_eq!(shape, vec![1, 2, 2, 2]);
        assert!(out[..4].iter().all(|&v| (v - 1.0).abs() < 1e-12));
        assert!(out[4..].iter().all(|&v| (v - 5.0).abs() < 1e-12));
    }

    #[test]
    fn test_curved_to_regular_rejects_bad_shapes() {
        let grid = create_two_by_two_grid();
        let mapper = RegularGridMapper::build(&grid.latitude, &grid.longitude, 0.5).unwrap();
        assert!(mapper.curved_to_regular(&[1.0; 8], &[2, 2, 2, 2]).is_err());
        assert!(mapper.curved_to_regular(&[1.0; 3], &[2, 2]).is_err());
        assert!(mapper.curved_to_regular(&[1.0; 4], &[4]).is_err());
    }

    #[test]
    fn test_build_rejects_degenerate_grids() {
        assert!(RegularGridMapper::build(&[1.0], &[1.0, 2.0], 0.5).is_err());
        assert!(RegularGridMapper::build(&[f64::NAN], &[f64::NAN], 0.5).is_err());
        assert!(RegularGridMapper::build(&[1.0, 2.0], &[1.0, 2.0], 0.0).is_err());
        assert!(RegularGridMapper::build(&[1.0, 1.0], &[1.0, 2.0], 0.5).is_err());
    }
}
