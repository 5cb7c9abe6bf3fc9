//! The closed set of stages and their dispatch.

use crate::cells::CellArray;
use crate::collector::Collector;
use crate::error::{Result, StageError};
use crate::threshold::ThresholdExceedance;
use crate::transform::{Divide, Speed, Subtract, SumAccumulation};

/// A node of a stage tree.
///
/// Intermediate stages own their children and forward transformed arrays to
/// them. Collectors are the leaves.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    SumAccumulation(SumAccumulation),
    Divide(Divide),
    Speed(Speed),
    Subtract(Subtract),
    Threshold(ThresholdExceedance),
    Collector(Collector),
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::SumAccumulation(_) => "sum accumulation",
            Stage::Divide(_) => "divide",
            Stage::Speed(_) => "speed",
            Stage::Subtract(_) => "subtract",
            Stage::Threshold(_) => "threshold exceedance",
            Stage::Collector(collector) => collector.name(),
        }
    }

    /// Process one set of input arrays.
    pub fn execute(&mut self, inputs: &[CellArray]) -> Result<()> {
        if inputs.is_empty() {
            return Err(StageError::NoInputs { stage: self.name() });
        }
        match self {
            Stage::SumAccumulation(stage) => stage.execute(inputs),
            Stage::Divide(stage) => stage.execute(inputs),
            Stage::Speed(stage) => stage.execute(inputs),
            Stage::Subtract(stage) => stage.execute(inputs),
            Stage::Threshold(stage) => stage.execute(inputs),
            Stage::Collector(collector) => collector.execute(inputs),
        }
    }

    /// Clear accumulated state here and in every descendant.
    pub fn reset(&mut self) {
        match self {
            Stage::SumAccumulation(stage) => stage.reset(),
            Stage::Divide(stage) => stage.reset(),
            Stage::Speed(stage) => stage.reset(),
            Stage::Subtract(stage) => stage.reset(),
            Stage::Threshold(stage) => stage.reset(),
            Stage::Collector(collector) => collector.reset(),
        }
    }

    /// Child stages. Empty for collectors.
    pub fn children(&self) -> &[Stage] {
        match self {
            Stage::SumAccumulation(stage) => stage.children(),
            Stage::Divide(stage) => stage.children(),
            Stage::Speed(stage) => stage.children(),
            Stage::Subtract(stage) => stage.children(),
            Stage::Threshold(stage) => stage.children(),
            Stage::Collector(_) => &[],
        }
    }

    /// Collectors under this stage, depth first.
    pub fn collectors(&self) -> Vec<&Collector> {
        let mut collectors = Vec::new();
        self.collect_leaves(&mut collectors);
        collectors
    }

    fn collect_leaves<'a>(&'a self, collectors: &mut Vec<&'a Collector>) {
        match self {
            Stage::Collector(collector) => collectors.push(collector),
            _ => {
                for child in self.children() {
                    child.collect_leaves(collectors);
                }
            }
        }
    }
}

/// Execute every child with the same arrays.
pub(crate) fn forward(children: &mut [Stage], outputs: &[CellArray]) -> Result<()> {
    for child in children {
        child.execute(outputs)?;
    }
    Ok(())
}

impl From<Collector> for Stage {
    fn from(collector: Collector) -> Self {
        Stage::Collector(collector)
    }
}

impl From<SumAccumulation> for Stage {
    fn from(stage: SumAccumulation) -> Self {
        Stage::SumAccumulation(stage)
    }
}

impl From<Divide> for Stage {
    fn from(stage: Divide) -> Self {
        Stage::Divide(stage)
    }
}

impl From<Speed> for Stage {
    fn from(stage: Speed) -> Self {
        Stage::Speed(stage)
    }
}

impl From<Subtract> for Stage {
    fn from(stage: Subtract) -> Self {
        Stage::Subtract(stage)
    }
}

impl From<ThresholdExceedance> for Stage {
    fn from(stage: ThresholdExceedance) -> Self {
        Stage::Threshold(stage)
    }
}
