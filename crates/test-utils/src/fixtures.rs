//! Common test fixtures for ocean-aggregate tests.
//!
//! This module provides pre-defined data for the aggregation scenarios the
//! pipeline and orchestrator tests share.

/// The four-slice fixture: a 2x2 grid with two depth layers observed at four
/// time slices, with a mix of valid and missing cells.
///
/// Arrays are flat in `[depth][row][col]` order, eight cells per slice.
pub mod four_slice {
    const NAN: f64 = f64::NAN;

    /// Number of depth layers
    pub const DEPTHS: usize = 2;

    /// Rows in one layer
    pub const ROWS: usize = 2;

    /// Columns in one layer
    pub const COLS: usize = 2;

    /// Cells in one depth layer
    pub const LAYER_CELLS: usize = ROWS * COLS;

    /// Cells in one time slice
    pub const CELLS: usize = DEPTHS * LAYER_CELLS;

    /// Depth values of the two layers (metres, negative down)
    pub const DEPTH_VALUES: [f64; DEPTHS] = [-1.5, -5.55];

    /// The four time slices.
    ///
    /// Cell 2 is missing everywhere. Cell 1 holds 1.0, NaN, 3.2 and 5.2.
    pub const SLICES: [[f64; CELLS]; 4] = [
        [1.2, 1.0, NAN, 4.0, 0.0, NAN, 2.5, -1.0],
        [2.2, NAN, NAN, 3.0, 0.5, NAN, 3.5, -2.0],
        [NAN, 3.2, NAN, 2.0, 1.0, NAN, NAN, -3.0],
        [3.6, 5.2, NAN, 1.0, 1.5, 7.0, 4.5, -4.0],
    ];

    /// Cell-wise sum of the four slices.
    pub const SUM: [f64; CELLS] = [7.0, 9.4, NAN, 10.0, 3.0, 7.0, 10.5, -10.0];

    /// Cell-wise mean over four executions (sum divided by four).
    pub const MEAN: [f64; CELLS] = [1.75, 2.35, NAN, 2.5, 0.75, 1.75, 2.625, -2.5];

    /// Cell-wise minimum.
    pub const MIN: [f64; CELLS] = [1.2, 1.0, NAN, 1.0, 0.0, 7.0, 2.5, -4.0];

    /// Cell-wise maximum.
    pub const MAX: [f64; CELLS] = [3.6, 5.2, NAN, 4.0, 1.5, 7.0, 4.5, -1.0];

    /// Exceedance counts for a global threshold of 2.0 with `>`.
    pub const COUNT_ABOVE_2: [f64; CELLS] = [2.0, 2.0, NAN, 2.0, 0.0, 1.0, 3.0, 0.0];

    /// Exceedance counts with zone `north` (layer cells 0 and 1) at 2.0 and
    /// zone `south` (layer cells 2 and 3) at 3.0, with `>`.
    pub const COUNT_ZONED: [f64; CELLS] = [2.0, 2.0, NAN, 1.0, 0.0, 1.0, 2.0, 0.0];

    /// Zone of each cell in one layer for [`COUNT_ZONED`].
    pub const ZONES: [&str; LAYER_CELLS] = ["north", "north", "south", "south"];

    /// All slices as owned arrays.
    pub fn slices() -> Vec<Vec<f64>> {
        SLICES.iter().map(|slice| slice.to_vec()).collect()
    }

    /// One slice as an owned array.
    pub fn slice(index: usize) -> Vec<f64> {
        SLICES[index].to_vec()
    }
}

/// Common time values for testing.
pub mod time {
    /// Reference time of the first fixture slice
    pub const REFERENCE_TIME: &str = "2023-01-01T00:00:00Z";

    /// Monthly time stamps covering the first quarter of 2023
    pub const MONTHLY_2023_Q1: [&str; 3] = [
        "2023-01-16T12:00:00Z",
        "2023-02-15T00:00:00Z",
        "2023-03-16T12:00:00Z",
    ];
}

#[cfg(test)]
mod tests {
    use super::four_slice::*;

    fn nan_eq(a: f64, b: f64) -> bool {
        (a.is_nan() && b.is_nan()) || (a - b).abs() < 1e-9
    }

    #[test]
    fn test_fixture_sum_matches_slices() {
        for cell in 0..CELLS {
            let values: Vec<f64> = SLICES.iter().map(|s| s[cell]).filter(|v| !v.is_nan()).collect();
            let expected = if values.is_empty() {
                f64::NAN
            } else {
                values.iter().sum()
            };
            assert!(nan_eq(SUM[cell], expected), "cell {}", cell);
            assert!(nan_eq(MEAN[cell], expected / 4.0), "cell {}", cell);
        }
    }

    #[test]
    fn test_fixture_shape() {
        assert_eq!(slices().len(), 4);
        assert_eq!(slice(0).len(), CELLS);
        assert_eq!(DEPTH_VALUES.len(), DEPTHS);
    }
}
