//! NaN-safe cell-wise primitives shared by the stages.
//!
//! A NaN cell means "no data". Merging a value into an accumulator skips NaN
//! values and lets the first valid value initialise a NaN accumulator, so an
//! accumulated cell never turns back into NaN.

use crate::error::{Result, StageError};

/// One flat array of grid cells.
pub type CellArray = Vec<f64>;

/// Merge `value` into `acc` using `combine` for two valid values.
#[inline]
pub fn merge_cell(acc: &mut f64, value: f64, combine: impl Fn(f64, f64) -> f64) {
    if value.is_nan() {
        return;
    }
    *acc = if acc.is_nan() {
        value
    } else {
        combine(*acc, value)
    };
}

/// Check that every array has the same length as the first.
pub fn check_same_length(stage: &'static str, arrays: &[CellArray]) -> Result<()> {
    if let Some(first) = arrays.first() {
        for array in &arrays[1..] {
            if array.len() != first.len() {
                return Err(StageError::LengthMismatch {
                    stage,
                    left: first.len(),
                    right: array.len(),
                });
            }
        }
    }
    Ok(())
}

/// Merge each input array into the buffer array at the same position.
///
/// The buffer is created on first use, shaped like `inputs` and filled with
/// NaN. Later calls must supply the same number of arrays with the same
/// lengths; the buffer is left untouched when they don't.
pub fn merge_into_buffer(
    stage: &'static str,
    buffer: &mut Option<Vec<CellArray>>,
    inputs: &[CellArray],
    combine: impl Fn(f64, f64) -> f64 + Copy,
) -> Result<()> {
    let buffer = buffer.get_or_insert_with(|| {
        inputs
            .iter()
            .map(|array| vec![f64::NAN; array.len()])
            .collect()
    });

    if buffer.len() != inputs.len() {
        return Err(StageError::InputCount {
            stage,
            expected: buffer.len(),
            actual: inputs.len(),
        });
    }
    for (acc, input) in buffer.iter().zip(inputs) {
        if acc.len() != input.len() {
            return Err(StageError::LengthMismatch {
                stage,
                left: acc.len(),
                right: input.len(),
            });
        }
    }

    for (acc, input) in buffer.iter_mut().zip(inputs) {
        for (cell, &value) in acc.iter_mut().zip(input) {
            merge_cell(cell, value, combine);
        }
    }
    Ok(())
}

/// Merge every input array into a single buffer array.
pub fn reduce_into_buffer(
    stage: &'static str,
    buffer: &mut Option<CellArray>,
    inputs: &[CellArray],
    combine: impl Fn(f64, f64) -> f64 + Copy,
) -> Result<()> {
    check_same_length(stage, inputs)?;
    let len = inputs.first().map(Vec::len).unwrap_or(0);
    let acc = buffer.get_or_insert_with(|| vec![f64::NAN; len]);
    if acc.len() != len {
        return Err(StageError::LengthMismatch {
            stage,
            left: acc.len(),
            right: len,
        });
    }

    for input in inputs {
        for (cell, &value) in acc.iter_mut().zip(input) {
            merge_cell(cell, value, combine);
        }
    }
    Ok(())
}

/// Apply a binary cell operation to two arrays. NaN on either side gives NaN.
pub fn zip_cells(
    stage: &'static str,
    left: &[f64],
    right: &[f64],
    op: impl Fn(f64, f64) -> f64,
) -> Result<CellArray> {
    if left.len() != right.len() {
        return Err(StageError::LengthMismatch {
            stage,
            left: left.len(),
            right: right.len(),
        });
    }
    Ok(left
        .iter()
        .zip(right)
        .map(|(&l, &r)| {
            if l.is_nan() || r.is_nan() {
                f64::NAN
            } else {
                op(l, r)
            }
        })
        .collect())
}

/// Require exactly `expected` input arrays.
pub fn require_arity(stage: &'static str, inputs: &[CellArray], expected: usize) -> Result<()> {
    if inputs.len() != expected {
        return Err(StageError::InputCount {
            stage,
            expected,
            actual: inputs.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_cell_skips_nan() {
        let mut acc = f64::NAN;
        merge_cell(&mut acc, f64::NAN, |a, b| a + b);
        assert!(acc.is_nan());

        merge_cell(&mut acc, 2.0, |a, b| a + b);
        assert_eq!(acc, 2.0);

        merge_cell(&mut acc, f64::NAN, |a, b| a + b);
        assert_eq!(acc, 2.0);

        merge_cell(&mut acc, 3.0, |a, b| a + b);
        assert_eq!(acc, 5.0);
    }

    #[test]
    fn test_merge_into_buffer_rejects_shape_change() {
        let mut buffer = None;
        merge_into_buffer("sum", &mut buffer, &[vec![1.0, 2.0]], |a, b| a + b).unwrap();

        let err = merge_into_buffer("sum", &mut buffer, &[vec![1.0]], |a, b| a + b).unwrap_err();
        assert!(matches!(err, StageError::LengthMismatch { left: 2, right: 1, .. }));

        let err = merge_into_buffer("sum", &mut buffer, &[vec![1.0, 2.0], vec![3.0, 4.0]], |a, b| a + b)
            .unwrap_err();
        assert!(matches!(err, StageError::InputCount { expected: 1, actual: 2, .. }));

        assert_eq!(buffer, Some(vec![vec![1.0, 2.0]]));
    }

    #[test]
    fn test_reduce_into_buffer_combines_variables() {
        let mut buffer = None;
        reduce_into_buffer(
            "sum",
            &mut buffer,
            &[vec![1.0, f64::NAN], vec![2.0, f64::NAN]],
            |a, b| a + b,
        )
        .unwrap();
        let acc = buffer.unwrap();
        assert_eq!(acc[0], 3.0);
        assert!(acc[1].is_nan());
    }

    #[test]
    fn test_zip_cells_propagates_nan() {
        let out = zip_cells("subtract", &[5.0, f64::NAN, 1.0], &[2.0, 1.0, f64::NAN], |a, b| a - b)
            .unwrap();
        assert_eq!(out[0], 3.0);
        assert!(out[1].is_nan());
        assert!(out[2].is_nan());

        assert!(zip_cells("subtract", &[1.0], &[1.0, 2.0], |a, b| a - b).is_err());
    }
}
