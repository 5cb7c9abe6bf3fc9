//! The orchestration chain.
//!
//! A run walks a fixed list of stages. Iterating stages call the rest of the
//! chain once per item (time instant, operator, depth chunk) and everything
//! downstream sees the current item through the [`PipelineContext`].

use aggregate_common::{ProductDefinition, Task};
use tracing::{debug, info, warn};

use crate::accumulation::{accumulate_chunk, peek_reference};
use crate::config::AggregationConfig;
use crate::context::{ChunkOutput, Collaborators, PipelineContext};
use crate::error::{AggregationError, Result};
use crate::gridding::regrid_chunk;
use crate::write::write_time_slice;

/// Stages of the orchestration chain, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Runs the rest of the chain once per time instant of the task
    TimeInstantIterator,
    /// Logs the time instant being processed
    TimeInstantExecutor,
    /// Runs the rest of the chain once per operator of the product
    OperatorIterator,
    /// Selects the time instant's inputs read by the operator
    InputIterator,
    /// Logs the operator being processed
    OperatorExecutor,
    /// Reads slices and aggregates them, once per depth chunk
    Accumulation,
    /// Reprojects aggregated chunks onto the regular grid
    RegularGridding,
    /// Writes aggregated chunks into the output dataset
    WriteTimeSlice,
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::TimeInstantIterator => "time_instant_iterator",
            StageKind::TimeInstantExecutor => "time_instant_executor",
            StageKind::OperatorIterator => "operator_iterator",
            StageKind::InputIterator => "input_iterator",
            StageKind::OperatorExecutor => "operator_executor",
            StageKind::Accumulation => "accumulation",
            StageKind::RegularGridding => "regular_gridding",
            StageKind::WriteTimeSlice => "write_time_slice",
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The stage chain used for every run.
pub fn build_chain() -> Vec<StageKind> {
    vec![
        StageKind::TimeInstantIterator,
        StageKind::TimeInstantExecutor,
        StageKind::OperatorIterator,
        StageKind::InputIterator,
        StageKind::OperatorExecutor,
        StageKind::Accumulation,
        StageKind::RegularGridding,
        StageKind::WriteTimeSlice,
    ]
}

/// Runs aggregation tasks through the stage chain.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    chain: Vec<StageKind>,
    config: AggregationConfig,
}

impl Orchestrator {
    pub fn new(config: AggregationConfig) -> Result<Self> {
        config.validate().map_err(AggregationError::config)?;
        Ok(Self {
            chain: build_chain(),
            config,
        })
    }

    pub fn chain(&self) -> &[StageKind] {
        &self.chain
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Process every time instant of `task` for `product`.
    ///
    /// The first error aborts the task.
    pub fn run(
        &self,
        task: &Task,
        product: &ProductDefinition,
        collaborators: &mut Collaborators<'_>,
    ) -> Result<()> {
        product.validate()?;
        task.validate()?;
        if task.product_id != product.id {
            return Err(AggregationError::config(format!(
                "task '{}' is for product '{}', not '{}'",
                task.id, task.product_id, product.id
            )));
        }

        let write_grid_file = product.write_grid_file && collaborators.output.is_some();
        if product.write_grid_file && !write_grid_file {
            warn!(
                product_id = %product.id,
                "No output dataset supplied, gridded output is skipped"
            );
        }
        if product.regular_grid_resolution.is_some() && collaborators.mapper.is_none() {
            warn!(
                product_id = %product.id,
                "No regular grid mapper supplied, output stays on the native grid"
            );
        }

        info!(
            task_id = %task.id,
            product_id = %product.id,
            time_instants = task.time_instants.len(),
            operators = product.operators.len(),
            "Starting aggregation task"
        );

        let mut ctx = PipelineContext::new(task, product, &self.config, write_grid_file);
        self.run_from(0, &mut ctx, collaborators, None)?;

        info!(task_id = %task.id, "Aggregation task complete");
        Ok(())
    }

    fn run_from<'a>(
        &self,
        position: usize,
        ctx: &mut PipelineContext<'a>,
        collaborators: &mut Collaborators<'_>,
        chunk: Option<ChunkOutput>,
    ) -> Result<()> {
        let kind = match self.chain.get(position) {
            Some(kind) => *kind,
            None => return Ok(()),
        };
        let next = position + 1;

        match kind {
            StageKind::TimeInstantIterator => {
                let task = ctx.task;
                for (index, instant) in task.time_instants.iter().enumerate() {
                    ctx.time_instant = Some(instant);
                    ctx.time_index = index;
                    self.run_from(next, ctx, collaborators, None)?;
                }
                ctx.time_instant = None;
                Ok(())
            }
            StageKind::TimeInstantExecutor => {
                let instant = ctx.time_instant()?;
                info!(
                    time_instant = %instant.value,
                    index = ctx.time_index,
                    inputs = instant.inputs.len(),
                    "Processing time instant"
                );
                self.run_from(next, ctx, collaborators, chunk)
            }
            StageKind::OperatorIterator => {
                let product = ctx.product;
                for operator in &product.operators {
                    ctx.operator = Some(operator);
                    self.run_from(next, ctx, collaborators, None)?;
                }
                ctx.operator = None;
                Ok(())
            }
            StageKind::InputIterator => {
                let instant = ctx.time_instant()?;
                let operator = ctx.operator()?;
                let inputs = instant.inputs_for(&operator.input_ids());
                if inputs.is_empty() {
                    debug!(
                        time_instant = %instant.value,
                        operator = operator.name(),
                        "No inputs for operator, skipping"
                    );
                    return Ok(());
                }
                ctx.inputs = inputs;
                let result = self.run_from(next, ctx, collaborators, chunk);
                ctx.inputs.clear();
                result
            }
            StageKind::OperatorExecutor => {
                let operator = ctx.operator()?;
                debug!(
                    operator = operator.name(),
                    operator_type = %operator.operator_type,
                    variables = operator.variables.len(),
                    inputs = ctx.inputs.len(),
                    "Executing operator"
                );
                self.run_from(next, ctx, collaborators, chunk)
            }
            StageKind::Accumulation => {
                let layout = peek_reference(ctx, collaborators)?;
                for depth_chunk in layout.depth_chunks(self.config.max_depths_per_chunk) {
                    if let Some(output) = accumulate_chunk(ctx, collaborators, &layout, &depth_chunk)? {
                        self.run_from(next, ctx, collaborators, Some(output))?;
                    }
                }
                Ok(())
            }
            StageKind::RegularGridding => {
                let chunk = match (chunk, collaborators.mapper) {
                    (Some(chunk), Some(mapper)) => Some(regrid_chunk(mapper, chunk)?),
                    (chunk, _) => chunk,
                };
                self.run_from(next, ctx, collaborators, chunk)
            }
            StageKind::WriteTimeSlice => {
                if let (Some(chunk), Some(output)) =
                    (chunk.as_ref(), collaborators.output.as_deref_mut())
                {
                    write_time_slice(output, ctx.operator()?, ctx.time_index, chunk)?;
                }
                self.run_from(next, ctx, collaborators, chunk)
            }
        }
    }
}
