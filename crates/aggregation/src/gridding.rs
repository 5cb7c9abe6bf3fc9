//! Regridding of aggregated chunks onto the regular lat/lon grid.

use regrid::RegularGridMapper;
use tracing::debug;

use crate::context::ChunkOutput;
use crate::error::Result;

/// Reproject every array of the chunk. The depth offset is unchanged.
pub fn regrid_chunk(mapper: &RegularGridMapper, chunk: ChunkOutput) -> Result<ChunkOutput> {
    let mut shape = chunk.shape.clone();
    let mut arrays = Vec::with_capacity(chunk.arrays.len());
    for array in &chunk.arrays {
        let (regridded, regridded_shape) = mapper.curved_to_regular(array, &chunk.shape)?;
        arrays.push(regridded);
        shape = regridded_shape;
    }
    debug!(
        from = ?chunk.shape,
        to = ?shape,
        arrays = arrays.len(),
        "Regridded chunk"
    );
    Ok(ChunkOutput {
        arrays,
        shape,
        depth_offset: chunk.depth_offset,
        has_depth: chunk.has_depth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{assert_cells_approx_eq, create_two_by_two_grid};

    #[test]
    fn test_regrid_keeps_depth_layers() {
        let grid = create_two_by_two_grid();
        let mapper = RegularGridMapper::build(&grid.latitude, &grid.longitude, 1.0).unwrap();
        let chunk = ChunkOutput {
            arrays: vec![vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]],
            shape: vec![1, 2, 2, 2],
            depth_offset: 4,
            has_depth: true,
        };

        let regridded = regrid_chunk(&mapper, chunk).unwrap();
        assert_eq!(
            regridded.shape,
            vec![1, 2, mapper.lat_count(), mapper.lon_count()]
        );
        assert_eq!(regridded.depth_offset, 4);
        let expected: Vec<f64> = mapper
            .curved_to_regular(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0], &[1, 2, 2, 2])
            .unwrap()
            .0;
        assert_cells_approx_eq!(regridded.arrays[0], expected, 1e-12);
    }
}
