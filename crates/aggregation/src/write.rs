//! Writing aggregated chunks into the gridded output.

use aggregate_common::SummaryOperator;
use tracing::debug;

use crate::context::ChunkOutput;
use crate::error::{AggregationError, Result};
use crate::io::OutputDataset;

/// Offset of a chunk within an output variable.
///
/// `[time, depth, 0, 0]` for variables with depth, `[time, 0, 0]` otherwise.
pub fn output_offset(time_index: usize, chunk: &ChunkOutput) -> Vec<usize> {
    if chunk.has_depth {
        vec![time_index, chunk.depth_offset, 0, 0]
    } else {
        vec![time_index, 0, 0]
    }
}

/// Write each result array of the chunk to the matching output variable.
pub fn write_time_slice(
    output: &mut dyn OutputDataset,
    operator: &SummaryOperator,
    time_index: usize,
    chunk: &ChunkOutput,
) -> Result<()> {
    if chunk.arrays.len() != operator.outputs.len() {
        return Err(AggregationError::OutputVariableCount {
            operator: operator.name().to_string(),
            expected: operator.outputs.len(),
            actual: chunk.arrays.len(),
        });
    }

    let offset = output_offset(time_index, chunk);
    for (variable, data) in operator.outputs.iter().zip(&chunk.arrays) {
        output.write(&variable.name, &offset, &chunk.shape, data)?;
    }
    debug!(
        operator = operator.name(),
        time_index,
        offset = ?offset,
        shape = ?chunk.shape,
        "Wrote time slice"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(has_depth: bool) -> ChunkOutput {
        ChunkOutput {
            arrays: vec![vec![0.0; 4]],
            shape: if has_depth { vec![1, 1, 2, 2] } else { vec![1, 2, 2] },
            depth_offset: 3,
            has_depth,
        }
    }

    #[test]
    fn test_output_offset() {
        assert_eq!(output_offset(2, &chunk(true)), vec![2, 3, 0, 0]);
        assert_eq!(output_offset(2, &chunk(false)), vec![2, 0, 0]);
    }
}
