//! Test data generators for curvilinear grids and cell arrays.
//!
//! All generators are deterministic so tests are reproducible.

/// A curvilinear grid as flat row-major latitude and longitude arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct CurvilinearGrid {
    pub rows: usize,
    pub cols: usize,
    pub latitude: Vec<f64>,
    pub longitude: Vec<f64>,
}

impl CurvilinearGrid {
    /// Number of grid cells.
    pub fn size(&self) -> usize {
        self.rows * self.cols
    }
}

/// Creates an axis-aligned grid with the given origin and spacing.
///
/// Row `r`, column `c` sits at `(lat0 + r*dlat, lon0 + c*dlon)`.
pub fn create_rectilinear_grid(
    rows: usize,
    cols: usize,
    lat0: f64,
    lon0: f64,
    dlat: f64,
    dlon: f64,
) -> CurvilinearGrid {
    let mut latitude = Vec::with_capacity(rows * cols);
    let mut longitude = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            latitude.push(lat0 + r as f64 * dlat);
            longitude.push(lon0 + c as f64 * dlon);
        }
    }
    CurvilinearGrid {
        rows,
        cols,
        latitude,
        longitude,
    }
}

/// Creates a grid whose rows are sheared eastwards, like a coast-following
/// ocean model grid.
///
/// Each row is shifted by `shear` degrees of longitude relative to the one
/// below it, so no two rows share longitudes.
pub fn create_sheared_grid(
    rows: usize,
    cols: usize,
    lat0: f64,
    lon0: f64,
    spacing: f64,
    shear: f64,
) -> CurvilinearGrid {
    let mut latitude = Vec::with_capacity(rows * cols);
    let mut longitude = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            latitude.push(lat0 + r as f64 * spacing);
            longitude.push(lon0 + c as f64 * spacing + r as f64 * shear);
        }
    }
    CurvilinearGrid {
        rows,
        cols,
        latitude,
        longitude,
    }
}

/// The 2x2 grid used by mapper round-trip tests.
pub fn create_two_by_two_grid() -> CurvilinearGrid {
    create_rectilinear_grid(2, 2, -20.0, 145.0, 1.0, 1.0)
}

/// Creates a cell array with a linear gradient.
pub fn create_gradient_cells(len: usize, start: f64, step: f64) -> Vec<f64> {
    (0..len).map(|i| start + i as f64 * step).collect()
}

/// Creates a cell array with NaN at the given positions and `value` elsewhere.
pub fn create_cells_with_nans(len: usize, value: f64, nan_positions: &[usize]) -> Vec<f64> {
    let mut data = vec![value; len];
    for &index in nan_positions {
        if index < len {
            data[index] = f64::NAN;
        }
    }
    data
}
