//! Terminal stages that accumulate inputs and expose results.

use aggregate_common::Comparison;

use crate::cells::{merge_into_buffer, zip_cells, CellArray};
use crate::error::{Result, StageError};

/// A terminal stage.
///
/// Buffers are absent until the first `execute` and dropped by `reset`.
/// `results` returns `None` while nothing has been collected.
#[derive(Debug, Clone, PartialEq)]
pub enum Collector {
    Sum(SumCollector),
    Mean(MeanCollector),
    MinMax(MinMaxCollector),
    Range(RangeCollector),
    Difference(DifferenceCollector),
}

impl Collector {
    pub fn sum() -> Self {
        Collector::Sum(SumCollector::default())
    }

    pub fn mean() -> Self {
        Collector::Mean(MeanCollector::default())
    }

    pub fn min() -> Self {
        Collector::MinMax(MinMaxCollector::min())
    }

    pub fn max() -> Self {
        Collector::MinMax(MinMaxCollector::max())
    }

    pub fn range() -> Self {
        Collector::Range(RangeCollector::default())
    }

    pub fn difference() -> Self {
        Collector::Difference(DifferenceCollector::default())
    }

    pub fn name(&self) -> &'static str {
        match self {
            Collector::Sum(_) => "sum collector",
            Collector::Mean(_) => "mean collector",
            Collector::MinMax(c) => c.name(),
            Collector::Range(_) => "range collector",
            Collector::Difference(_) => "difference collector",
        }
    }

    pub fn execute(&mut self, inputs: &[CellArray]) -> Result<()> {
        match self {
            Collector::Sum(c) => c.execute(inputs),
            Collector::Mean(c) => c.execute(inputs),
            Collector::MinMax(c) => c.execute(inputs),
            Collector::Range(c) => c.execute(inputs),
            Collector::Difference(c) => c.execute(inputs),
        }
    }

    pub fn reset(&mut self) {
        match self {
            Collector::Sum(c) => c.reset(),
            Collector::Mean(c) => c.reset(),
            Collector::MinMax(c) => c.reset(),
            Collector::Range(c) => c.reset(),
            Collector::Difference(c) => c.reset(),
        }
    }

    pub fn results(&self) -> Result<Option<Vec<CellArray>>> {
        match self {
            Collector::Sum(c) => Ok(c.results()),
            Collector::Mean(c) => Ok(c.results()),
            Collector::MinMax(c) => Ok(c.results()),
            Collector::Range(c) => Ok(c.results()),
            Collector::Difference(c) => c.results(),
        }
    }
}

/// Running cell-wise sum of each input variable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SumCollector {
    buffer: Option<Vec<CellArray>>,
    executions: usize,
}

impl SumCollector {
    pub fn execute(&mut self, inputs: &[CellArray]) -> Result<()> {
        merge_into_buffer("sum collector", &mut self.buffer, inputs, |acc, v| acc + v)?;
        self.executions += 1;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.buffer = None;
        self.executions = 0;
    }

    /// Number of executions since the last reset.
    pub fn executions(&self) -> usize {
        self.executions
    }

    pub fn results(&self) -> Option<Vec<CellArray>> {
        self.buffer.clone()
    }
}

/// Running mean: the cell sum divided by the number of executions.
///
/// The divisor is the execution count, not the number of valid values a cell
/// received.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeanCollector {
    sum: SumCollector,
}

impl MeanCollector {
    pub fn execute(&mut self, inputs: &[CellArray]) -> Result<()> {
        self.sum.execute(inputs)
    }

    pub fn reset(&mut self) {
        self.sum.reset();
    }

    pub fn results(&self) -> Option<Vec<CellArray>> {
        let executions = self.sum.executions() as f64;
        self.sum.buffer.as_ref().map(|buffer| {
            buffer
                .iter()
                .map(|array| array.iter().map(|&sum| sum / executions).collect())
                .collect()
        })
    }
}

/// Running extremum per cell. `>` keeps the maximum, `<` the minimum.
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxCollector {
    comparison: Comparison,
    buffer: Option<Vec<CellArray>>,
}

impl MinMaxCollector {
    pub fn new(comparison: Comparison) -> Self {
        Self {
            comparison,
            buffer: None,
        }
    }

    pub fn min() -> Self {
        Self::new(Comparison::LessThan)
    }

    pub fn max() -> Self {
        Self::new(Comparison::GreaterThan)
    }

    pub fn comparison(&self) -> Comparison {
        self.comparison
    }

    fn name(&self) -> &'static str {
        match self.comparison {
            Comparison::GreaterThan | Comparison::GreaterThanOrEqual => "max collector",
            Comparison::LessThan | Comparison::LessThanOrEqual => "min collector",
        }
    }

    pub fn execute(&mut self, inputs: &[CellArray]) -> Result<()> {
        let comparison = self.comparison;
        let stage = self.name();
        merge_into_buffer(stage, &mut self.buffer, inputs, move |acc, v| {
            if comparison.test(v, acc) {
                v
            } else {
                acc
            }
        })
    }

    pub fn reset(&mut self) {
        self.buffer = None;
    }

    pub fn results(&self) -> Option<Vec<CellArray>> {
        self.buffer.clone()
    }
}

/// Min and max per cell plus their absolute difference.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeCollector {
    min: MinMaxCollector,
    max: MinMaxCollector,
}

impl Default for RangeCollector {
    fn default() -> Self {
        Self {
            min: MinMaxCollector::min(),
            max: MinMaxCollector::max(),
        }
    }
}

impl RangeCollector {
    pub fn execute(&mut self, inputs: &[CellArray]) -> Result<()> {
        self.min.execute(inputs)?;
        self.max.execute(inputs)
    }

    pub fn reset(&mut self) {
        self.min.reset();
        self.max.reset();
    }

    /// `[min, max, |max - min|]` for each input variable in turn.
    pub fn results(&self) -> Option<Vec<CellArray>> {
        let (mins, maxs) = match (self.min.results(), self.max.results()) {
            (Some(mins), Some(maxs)) => (mins, maxs),
            _ => return None,
        };

        let mut results = Vec::with_capacity(mins.len() * 3);
        for (min, max) in mins.into_iter().zip(maxs) {
            let range = min
                .iter()
                .zip(&max)
                .map(|(&lo, &hi)| {
                    if lo.is_nan() || hi.is_nan() {
                        f64::NAN
                    } else {
                        (hi - lo).abs()
                    }
                })
                .collect();
            results.push(min);
            results.push(max);
            results.push(range);
        }
        Some(results)
    }
}

/// Records input arrays and differences them on demand.
///
/// An execution carrying two arrays is one minuend/subtrahend pair (both
/// variables read from the same input). Single arrays are recorded in order
/// and read as N minuends followed by N subtrahends (one variable per input,
/// the first input's slices arriving first). With more than one pair the
/// pairwise differences are averaged per cell, ignoring NaN differences.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DifferenceCollector {
    pairs: Vec<(CellArray, CellArray)>,
    sequential: Vec<CellArray>,
}

impl DifferenceCollector {
    const STAGE: &'static str = "difference collector";

    pub fn execute(&mut self, inputs: &[CellArray]) -> Result<()> {
        match inputs {
            [minuend, subtrahend] => self.pairs.push((minuend.clone(), subtrahend.clone())),
            _ => self.sequential.extend(inputs.iter().cloned()),
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        self.pairs.clear();
        self.sequential.clear();
    }

    pub fn results(&self) -> Result<Option<Vec<CellArray>>> {
        if self.pairs.is_empty() && self.sequential.is_empty() {
            return Ok(None);
        }
        if self.sequential.len() % 2 != 0 {
            return Err(StageError::OddArrayCount(self.sequential.len()));
        }

        let (minuends, subtrahends) = self.sequential.split_at(self.sequential.len() / 2);
        let differences = self
            .pairs
            .iter()
            .map(|(a, b)| (a, b))
            .chain(minuends.iter().zip(subtrahends))
            .map(|(a, b)| zip_cells(Self::STAGE, a, b, |a, b| a - b))
            .collect::<Result<Vec<_>>>()?;

        if differences.len() == 1 {
            return Ok(Some(differences));
        }

        let len = differences[0].len();
        let mut sums = vec![0.0; len];
        let mut counts = vec![0usize; len];
        for difference in &differences {
            if difference.len() != len {
                return Err(StageError::LengthMismatch {
                    stage: Self::STAGE,
                    left: len,
                    right: difference.len(),
                });
            }
            for (i, &d) in difference.iter().enumerate() {
                if !d.is_nan() {
                    sums[i] += d;
                    counts[i] += 1;
                }
            }
        }

        let mean = sums
            .into_iter()
            .zip(counts)
            .map(|(sum, count)| {
                if count == 0 {
                    f64::NAN
                } else {
                    sum / count as f64
                }
            })
            .collect();
        Ok(Some(vec![mean]))
    }
}
