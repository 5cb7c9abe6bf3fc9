//! A stage tree with a single entry point.

use crate::cells::CellArray;
use crate::error::Result;
use crate::stage::Stage;

/// Owns the entry stage of a stage tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    entry: Stage,
}

impl Pipeline {
    pub fn new(entry: impl Into<Stage>) -> Self {
        Self {
            entry: entry.into(),
        }
    }

    pub fn entry(&self) -> &Stage {
        &self.entry
    }

    pub fn execute(&mut self, inputs: &[CellArray]) -> Result<()> {
        self.entry.execute(inputs)
    }

    pub fn reset(&mut self) {
        self.entry.reset();
    }

    /// Number of collectors in the tree.
    pub fn collector_count(&self) -> usize {
        self.entry.collectors().len()
    }

    /// Results of every collector, concatenated in depth-first order.
    ///
    /// `None` while no collector holds data.
    pub fn results(&self) -> Result<Option<Vec<CellArray>>> {
        let mut results: Option<Vec<CellArray>> = None;
        for collector in self.entry.collectors() {
            if let Some(arrays) = collector.results()? {
                results.get_or_insert_with(Vec::new).extend(arrays);
            }
        }
        Ok(results)
    }
}
