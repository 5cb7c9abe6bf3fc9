//! Test support for the ocean-aggregate crates.
//!
//! - [`assert_approx_eq!`] and [`assert_cells_approx_eq!`] compare values
//!   where NaN means "no data"
//! - [`four_slice`] is a small depth-resolved fixture with hand-computed
//!   aggregation results
//! - the generators build curvilinear grids and cell arrays
//!
//! ```ignore
//! use test_utils::{assert_cells_approx_eq, four_slice};
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::*;
pub use generators::*;

/// Assert two scalars are within `epsilon` of each other.
///
/// Two NaNs compare equal; NaN against a number fails.
///
/// ```ignore
/// assert_approx_eq!(2.35, 9.4 / 4.0, 1e-12);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let matches = if left.is_nan() || right.is_nan() {
            left.is_nan() && right.is_nan()
        } else {
            (left - right).abs() <= epsilon
        };
        if !matches {
            panic!(
                "assertion failed: {:?} and {:?} differ by more than {:?}",
                left, right, epsilon
            );
        }
    }};
}

/// Macro for approximate equality of two cell arrays.
///
/// NaN is treated as a value: a NaN cell only matches a NaN cell.
///
/// ```ignore
/// use test_utils::assert_cells_approx_eq;
///
/// assert_cells_approx_eq!(&[1.0, f64::NAN], &[1.00001, f64::NAN], 1e-4);
/// ```
#[macro_export]
macro_rules! assert_cells_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: &[f64] = &$left[..];
        let right: &[f64] = &$right[..];
        let epsilon: f64 = $epsilon as f64;
        if left.len() != right.len() {
            panic!(
                "assertion failed: cell arrays differ in length ({} != {})\n  left: `{:?}`,\n right: `{:?}`",
                left.len(),
                right.len(),
                left,
                right
            );
        }
        for (index, (l, r)) in left.iter().zip(right.iter()).enumerate() {
            let matches = if l.is_nan() || r.is_nan() {
                l.is_nan() && r.is_nan()
            } else {
                (l - r).abs() <= epsilon
            };
            if !matches {
                panic!(
                    "assertion failed: cell {} differs (`{:?}` vs `{:?}`, epsilon `{:?}`)\n  left: `{:?}`,\n right: `{:?}`",
                    index, l, r, epsilon, left, right
                );
            }
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_approx_eq_accepts_nan_pair() {
        assert_approx_eq!(1.75, 7.0 / 4.0, 1e-12);
        assert_approx_eq!(f64::NAN, f64::NAN, 0.0);
    }

    #[test]
    #[should_panic(expected = "differ by more than")]
    fn test_assert_approx_eq_rejects_nan_against_value() {
        assert_approx_eq!(f64::NAN, 0.0, 1.0);
    }

    #[test]
    fn test_assert_cells_approx_eq_matches_nan() {
        assert_cells_approx_eq!(vec![1.0, f64::NAN, -2.0], vec![1.00001, f64::NAN, -2.0], 1e-4);
    }

    #[test]
    #[should_panic(expected = "cell 1 differs")]
    fn test_assert_cells_approx_eq_nan_vs_value() {
        assert_cells_approx_eq!(vec![1.0, f64::NAN], vec![1.0, 0.0], 1e-4);
    }

    #[test]
    #[should_panic(expected = "differ in length")]
    fn test_assert_cells_approx_eq_length() {
        assert_cells_approx_eq!(vec![1.0], vec![1.0, 2.0], 1e-4);
    }
}
