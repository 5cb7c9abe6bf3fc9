//! Accumulation stage: streams time slices, one depth chunk at a time, into
//! the aggregator and the summary accumulator.

use aggregate_common::{
    days_in_month, AggregationPeriod, Input, OperatorType, ProductDefinition, SummaryKind,
    SummaryOperator, ThresholdValues, TimeIncrement,
};
use chrono::{DateTime, Utc};
use stage_pipeline::ZoneLookup;
use tracing::{debug, info};

use crate::aggregator::Aggregator;
use crate::context::{ChunkOutput, Collaborators, PipelineContext};
use crate::error::{AggregationError, Result};
use crate::io::{SummaryAccumulator, VariableMetadata};
use crate::summary::{SiteAccumulator, SummaryStatistics, ZoneAccumulator};

/// A run of consecutive selected depths read together.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthChunk {
    /// Position of the first depth among the selected depths
    pub offset: usize,
    /// Dataset depth indices, empty for variables without depth
    pub indices: Vec<usize>,
    pub depths: Vec<f64>,
}

impl DepthChunk {
    /// Number of depth layers in the chunk (1 without depth).
    pub fn layers(&self) -> usize {
        self.indices.len().max(1)
    }
}

/// Layout of the operator's data, read from the reference input.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceLayout {
    pub input_id: String,
    pub variable: VariableMetadata,
    pub rows: usize,
    pub cols: usize,
    /// Selected depth values
    pub depths: Vec<f64>,
    /// Dataset indices of the selected depths
    pub depth_indices: Vec<usize>,
}

impl ReferenceLayout {
    pub fn layer_cells(&self) -> usize {
        self.rows * self.cols
    }

    /// Split the selected depths into chunks of at most `max_depths`.
    pub fn depth_chunks(&self, max_depths: usize) -> Vec<DepthChunk> {
        if !self.variable.has_depth() || self.depth_indices.is_empty() {
            return vec![DepthChunk {
                offset: 0,
                indices: Vec::new(),
                depths: Vec::new(),
            }];
        }
        self.depth_indices
            .chunks(max_depths.max(1))
            .zip(self.depths.chunks(max_depths.max(1)))
            .enumerate()
            .map(|(i, (indices, depths))| DepthChunk {
                offset: i * max_depths.max(1),
                indices: indices.to_vec(),
                depths: depths.to_vec(),
            })
            .collect()
    }
}

/// Input whose dataset defines the output layout: the product's reference
/// input, else the input of the operator's first variable.
pub fn reference_input_id<'a>(ctx: &PipelineContext<'a>, operator: &'a SummaryOperator) -> Result<&'a str> {
    let product: &'a ProductDefinition = ctx.product;
    if let Some(reference) = product.reference_input_id.as_deref() {
        return Ok(reference);
    }
    operator
        .variables
        .first()
        .map(|variable| variable.input_id())
        .ok_or_else(|| {
            AggregationError::config(format!("operator '{}' has no variables", operator.name()))
        })
}

/// Peek at the reference dataset for shape and depths. The dataset is
/// dropped before returning.
pub fn peek_reference(
    ctx: &PipelineContext<'_>,
    collaborators: &mut Collaborators<'_>,
) -> Result<ReferenceLayout> {
    let operator = ctx.operator()?;
    let input_id = reference_input_id(ctx, operator)?;
    let dataset = collaborators.datasets.reference_dataset(input_id)?;

    let variable_name = operator
        .variables
        .iter()
        .find(|variable| variable.input_id() == input_id)
        .or_else(|| operator.variables.first())
        .map(|variable| variable.variable())
        .ok_or_else(|| AggregationError::config("operator has no variables"))?;

    let variable = dataset
        .variable(variable_name)
        .ok_or_else(|| AggregationError::UnresolvableVariable {
            input_id: input_id.to_string(),
            variable: variable_name.to_string(),
        })?;
    let (rows, cols) = variable.grid_shape()?;

    let (depths, depth_indices) = if variable.has_depth() {
        let depths = match &ctx.product.depths {
            Some(selected) => selected.clone(),
            None => dataset.depths(),
        };
        let indices = dataset.depth_indices(&depths)?;
        (depths, indices)
    } else {
        (Vec::new(), Vec::new())
    };

    debug!(
        input_id,
        variable = variable_name,
        data_type = ?variable.data_type,
        shape = ?variable.shape,
        time_dimension = ?variable.time_dimension,
        depths = depths.len(),
        "Peeked reference dataset"
    );

    Ok(ReferenceLayout {
        input_id: input_id.to_string(),
        variable,
        rows,
        cols,
        depths,
        depth_indices,
    })
}

/// Number of times a slice is added.
///
/// Annual means of monthly inputs weight each month by its length: the slice
/// is added once per calendar day of its month. This approximates a daily
/// mean; every day of the month gets the monthly value.
fn replay_count(
    ctx: &PipelineContext<'_>,
    operator: &SummaryOperator,
    input: &Input,
    time: &DateTime<Utc>,
) -> Result<u32> {
    if !ctx.config.replay_monthly_days
        || operator.operator_type != OperatorType::Mean
        || ctx.product.aggregation_period != AggregationPeriod::Annual
    {
        return Ok(1);
    }
    let definition = ctx.product.input(&input.input_id).ok_or_else(|| {
        AggregationError::config(format!("input '{}' is not defined", input.input_id))
    })?;
    if definition.time_increment == TimeIncrement::Monthly {
        Ok(days_in_month(time))
    } else {
        Ok(1)
    }
}

/// Per-zone thresholds need a zone lookup covering exactly one grid layer.
fn check_threshold_zones(
    operator: &SummaryOperator,
    zones: Option<&ZoneLookup>,
    layout: &ReferenceLayout,
) -> Result<()> {
    let per_zone = matches!(
        operator.threshold.as_ref().map(|t| &t.thresholds),
        Some(ThresholdValues::PerZone(_))
    );
    match zones.and_then(ZoneLookup::layer_cells) {
        Some(zone_cells) if per_zone && zone_cells != layout.layer_cells() => {
            Err(AggregationError::config(format!(
                "zone lookup covers {} cells, grid layer of '{}' has {}",
                zone_cells,
                layout.variable.name,
                layout.layer_cells()
            )))
        }
        _ => Ok(()),
    }
}

fn build_accumulator(
    ctx: &PipelineContext<'_>,
    collaborators: &Collaborators<'_>,
    layout: &ReferenceLayout,
    chunk: &DepthChunk,
) -> Result<Option<Box<dyn SummaryAccumulator>>> {
    let kind = match ctx.product.summary {
        Some(kind) => kind,
        None => return Ok(None),
    };
    if collaborators.summary_writer.is_none() {
        return Err(AggregationError::config(format!(
            "product '{}' requests {:?} summaries but no summary writer was supplied",
            ctx.product.id, kind
        )));
    }
    let accumulator: Box<dyn SummaryAccumulator> = match kind {
        SummaryKind::Zone => {
            let zones = collaborators
                .zones
                .clone()
                .ok_or(AggregationError::MissingZoneMap)?;
            Box::new(ZoneAccumulator::new(zones, layout.layer_cells(), &chunk.depths)?)
        }
        SummaryKind::Site => {
            let sites = collaborators
                .sites
                .clone()
                .ok_or(AggregationError::MissingSiteMap)?;
            Box::new(SiteAccumulator::new(sites, layout.layer_cells(), &chunk.depths)?)
        }
    };
    Ok(Some(accumulator))
}

/// Read, aggregate and summarise one depth chunk of the current time instant
/// and operator. Returns the aggregated arrays when a grid file is populated.
pub fn accumulate_chunk(
    ctx: &PipelineContext<'_>,
    collaborators: &mut Collaborators<'_>,
    layout: &ReferenceLayout,
    chunk: &DepthChunk,
) -> Result<Option<ChunkOutput>> {
    let instant = ctx.time_instant()?;
    let operator = ctx.operator()?;

    let mut aggregator = if ctx.write_grid_file {
        check_threshold_zones(operator, collaborators.zones.as_deref(), layout)?;
        Some(Aggregator::new(operator, collaborators.zones.clone())?)
    } else {
        None
    };
    let mut accumulator = build_accumulator(ctx, collaborators, layout, chunk)?;
    if aggregator.is_none() && accumulator.is_none() {
        debug!(operator = operator.name(), "Nothing to accumulate");
        return Ok(None);
    }

    let expected_len = chunk.layers() * layout.layer_cells();
    for input in &ctx.inputs {
        let variables: Vec<&str> = operator
            .variables_for_input(&input.input_id)
            .map(|variable| variable.variable())
            .collect();
        if variables.is_empty() {
            continue;
        }

        for bounds in &input.file_bounds {
            let dataset = collaborators.datasets.retrieve(&bounds.file_id)?;
            for &name in &variables {
                if dataset.variable(name).is_none() {
                    return Err(AggregationError::UnresolvableVariable {
                        input_id: input.input_id.clone(),
                        variable: name.to_string(),
                    });
                }
            }

            for time_index in bounds.indices() {
                let time = dataset.time_at(time_index)?;
                let arrays = variables
                    .iter()
                    .map(|name| dataset.read_single_time_slice(name, time_index, &chunk.indices))
                    .collect::<Result<Vec<_>>>()?;
                if let Some(array) = arrays.iter().find(|a| a.len() != expected_len) {
                    return Err(AggregationError::shape_mismatch(format!(
                        "file '{}' slice {} has {} values, expected {}",
                        bounds.file_id,
                        time_index,
                        array.len(),
                        expected_len
                    )));
                }

                let repeats = replay_count(ctx, operator, input, &time)?;
                if repeats > 1 {
                    debug!(time = %time, repeats, "Replaying monthly slice once per day");
                }
                for _ in 0..repeats {
                    if let Some(aggregator) = aggregator.as_mut() {
                        aggregator.add(time, &arrays)?;
                    }
                    if let Some(accumulator) = accumulator.as_mut() {
                        accumulator.add(&arrays)?;
                    }
                }
            }
        }
    }

    if let Some(accumulator) = accumulator.as_mut() {
        write_statistics(collaborators, instant.value, operator, accumulator.as_ref())?;
        accumulator.reset();
    }

    let aggregator = match aggregator {
        Some(aggregator) => aggregator,
        None => return Ok(None),
    };
    let arrays = match aggregator.results()? {
        Some(arrays) => arrays,
        None => {
            debug!(operator = operator.name(), "No slices aggregated");
            return Ok(None);
        }
    };

    let has_depth = layout.variable.has_depth();
    let shape = if has_depth {
        vec![1, chunk.layers(), layout.rows, layout.cols]
    } else {
        vec![1, layout.rows, layout.cols]
    };
    info!(
        operator = operator.name(),
        depth_offset = chunk.offset,
        depths = chunk.indices.len(),
        slices = aggregator.slice_count(),
        time_range = ?aggregator.time_range(),
        "Aggregated depth chunk"
    );

    Ok(Some(ChunkOutput {
        arrays,
        shape,
        depth_offset: chunk.offset,
        has_depth,
    }))
}

fn write_statistics(
    collaborators: &mut Collaborators<'_>,
    timestamp: DateTime<Utc>,
    operator: &SummaryOperator,
    accumulator: &dyn SummaryAccumulator,
) -> Result<()> {
    let writer = match collaborators.summary_writer.as_deref_mut() {
        Some(writer) => writer,
        None => return Ok(()),
    };
    for bucket in accumulator.buckets() {
        for (id, samples) in &bucket.samples {
            if let Some(statistics) = SummaryStatistics::from_samples(samples) {
                writer.write(timestamp, operator.name(), bucket.depth, id, &statistics)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::DataType;

    fn layout(depth_indices: Vec<usize>) -> ReferenceLayout {
        ReferenceLayout {
            input_id: "hydro".to_string(),
            variable: VariableMetadata {
                name: "temp".to_string(),
                data_type: DataType::Float32,
                shape: vec![4, 6, 2, 2],
                time_dimension: Some(0),
                depth_dimension: Some(1),
            },
            rows: 2,
            cols: 2,
            depths: depth_indices.iter().map(|&i| -(i as f64)).collect(),
            depth_indices,
        }
    }

    #[test]
    fn test_depth_chunks() {
        let chunks = layout(vec![0, 1, 2, 3, 4, 5]).depth_chunks(4);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].offset, 0);
        assert_eq!(chunks[0].indices, vec![0, 1, 2, 3]);
        assert_eq!(chunks[1].offset, 4);
        assert_eq!(chunks[1].indices, vec![4, 5]);
        assert_eq!(chunks[1].depths, vec![-4.0, -5.0]);
    }

    fn per_zone_threshold() -> SummaryOperator {
        serde_yaml::from_str(
            r#"
type: threshold_count
variables: ["hydro::temp"]
outputs: [{ name: temp_exceedance }]
threshold:
  comparison: greater_than
  thresholds:
    per_zone: { north: [2.0], south: [3.0] }
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_per_zone_thresholds_need_matching_zone_lookup() {
        let layout = layout(vec![0, 1]);
        let operator = per_zone_threshold();

        let matching = ZoneLookup::from_cells(&[Some("north"), Some("north"), Some("south"), Some("south")]);
        check_threshold_zones(&operator, Some(&matching), &layout).unwrap();
        check_threshold_zones(&operator, Some(&ZoneLookup::global()), &layout).unwrap();

        let other_grid = ZoneLookup::from_cells(&[Some("north"), Some("south"), Some("south")]);
        let err = check_threshold_zones(&operator, Some(&other_grid), &layout).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_single_chunk_without_depth() {
        let mut layout = layout(Vec::new());
        layout.variable.depth_dimension = None;
        let chunks = layout.depth_chunks(4);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].indices.is_empty());
        assert_eq!(chunks[0].layers(), 1);
    }
}
