//! Intermediate stages that transform inputs and forward them to children.

use tracing::trace;

use crate::cells::{merge_into_buffer, reduce_into_buffer, require_arity, zip_cells, CellArray};
use crate::error::{Result, StageError};
use crate::stage::{forward, Stage};

/// How a [`SumAccumulation`] combines its input variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccumulationMode {
    /// One output array per input variable
    #[default]
    PerVariable,
    /// All input variables summed into one output array
    Combined,
}

/// Windowed cell-wise sum.
///
/// Sums each cell over `window` executions, then forwards the sums to its
/// children and starts a new window. A partial window is never forwarded.
#[derive(Debug, Clone, PartialEq)]
pub struct SumAccumulation {
    window: usize,
    mode: AccumulationMode,
    per_variable: Option<Vec<CellArray>>,
    combined: Option<CellArray>,
    count: usize,
    children: Vec<Stage>,
}

impl SumAccumulation {
    const STAGE: &'static str = "sum accumulation";

    pub fn new(window: usize, mode: AccumulationMode) -> Result<Self> {
        if window == 0 {
            return Err(StageError::invalid_config(
                "sum accumulation window must be > 0",
            ));
        }
        Ok(Self {
            window,
            mode,
            per_variable: None,
            combined: None,
            count: 0,
            children: Vec::new(),
        })
    }

    pub fn with_child(mut self, child: impl Into<Stage>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn children(&self) -> &[Stage] {
        &self.children
    }

    pub fn execute(&mut self, inputs: &[CellArray]) -> Result<()> {
        match self.mode {
            AccumulationMode::PerVariable => {
                merge_into_buffer(Self::STAGE, &mut self.per_variable, inputs, |acc, v| acc + v)?
            }
            AccumulationMode::Combined => {
                reduce_into_buffer(Self::STAGE, &mut self.combined, inputs, |acc, v| acc + v)?
            }
        }
        self.count += 1;

        if self.count < self.window {
            return Ok(());
        }

        let sums = match self.mode {
            AccumulationMode::PerVariable => self.per_variable.take().unwrap_or_default(),
            AccumulationMode::Combined => self.combined.take().into_iter().collect(),
        };
        self.count = 0;
        trace!(window = self.window, arrays = sums.len(), "Accumulation window complete");
        forward(&mut self.children, &sums)
    }

    pub fn reset(&mut self) {
        self.per_variable = None;
        self.combined = None;
        self.count = 0;
        self.children.iter_mut().for_each(Stage::reset);
    }
}

/// Divides every cell of every array by a fixed divisor.
#[derive(Debug, Clone, PartialEq)]
pub struct Divide {
    divisor: f64,
    children: Vec<Stage>,
}

impl Divide {
    pub fn new(divisor: f64) -> Result<Self> {
        if divisor == 0.0 || !divisor.is_finite() {
            return Err(StageError::invalid_config(format!(
                "divisor must be finite and non-zero, got {}",
                divisor
            )));
        }
        Ok(Self {
            divisor,
            children: Vec::new(),
        })
    }

    pub fn with_child(mut self, child: impl Into<Stage>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children(&self) -> &[Stage] {
        &self.children
    }

    pub fn execute(&mut self, inputs: &[CellArray]) -> Result<()> {
        let divided: Vec<CellArray> = inputs
            .iter()
            .map(|array| array.iter().map(|&v| v / self.divisor).collect())
            .collect();
        forward(&mut self.children, &divided)
    }

    pub fn reset(&mut self) {
        self.children.iter_mut().for_each(Stage::reset);
    }
}

/// Magnitude of a vector given as U and V component arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Speed {
    children: Vec<Stage>,
}

impl Speed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_child(mut self, child: impl Into<Stage>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children(&self) -> &[Stage] {
        &self.children
    }

    pub fn execute(&mut self, inputs: &[CellArray]) -> Result<()> {
        require_arity("speed", inputs, 2)?;
        let speed = zip_cells("speed", &inputs[0], &inputs[1], |u, v| u.hypot(v))?;
        forward(&mut self.children, &[speed])
    }

    pub fn reset(&mut self) {
        self.children.iter_mut().for_each(Stage::reset);
    }
}

/// Cell-wise `A - B` of exactly two arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Subtract {
    children: Vec<Stage>,
}

impl Subtract {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_child(mut self, child: impl Into<Stage>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children(&self) -> &[Stage] {
        &self.children
    }

    pub fn execute(&mut self, inputs: &[CellArray]) -> Result<()> {
        require_arity("subtract", inputs, 2)?;
        let difference = zip_cells("subtract", &inputs[0], &inputs[1], |a, b| a - b)?;
        forward(&mut self.children, &[difference])
    }

    pub fn reset(&mut self) {
        self.children.iter_mut().for_each(Stage::reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::Collector;
    use crate::pipeline::Pipeline;
    use test_utils::assert_cells_approx_eq;

    #[test]
    fn test_speed() {
        let mut pipeline = Pipeline::new(Speed::new().with_child(Collector::sum()));
        pipeline
            .execute(&[vec![3.0, f64::NAN, 1.0], vec![-4.0, 1.0, f64::NAN]])
            .unwrap();
        let results = pipeline.results().unwrap().unwrap();
        assert_cells_approx_eq!(results[0], vec![5.0, f64::NAN, f64::NAN], 1e-12);
    }

    #[test]
    fn test_speed_arity() {
        let mut speed = Stage::from(Speed::new());
        let err = speed.execute(&[vec![1.0]]).unwrap_err();
        assert_eq!(
            err,
            StageError::InputCount {
                stage: "speed",
                expected: 2,
                actual: 1
            }
        );
        assert!(speed
            .execute(&[vec![1.0], vec![1.0], vec![1.0]])
            .is_err());
    }

    #[test]
    fn test_subtract() {
        let mut pipeline = Pipeline::new(Subtract::new().with_child(Collector::sum()));
        pipeline
            .execute(&[vec![5.0, f64::NAN], vec![1.5, 2.0]])
            .unwrap();
        let results = pipeline.results().unwrap().unwrap();
        assert_cells_approx_eq!(results[0], vec![3.5, f64::NAN], 1e-12);
    }

    #[test]
    fn test_divide() {
        let mut pipeline = Pipeline::new(Divide::new(4.0).unwrap().with_child(Collector::sum()));
        pipeline.execute(&[vec![2.0, f64::NAN]]).unwrap();
        let results = pipeline.results().unwrap().unwrap();
        assert_cells_approx_eq!(results[0], vec![0.5, f64::NAN], 1e-12);
        assert!(Divide::new(0.0).is_err());
    }

    #[test]
    fn test_sum_accumulation_forwards_full_windows() {
        let accumulation = SumAccumulation::new(2, AccumulationMode::PerVariable)
            .unwrap()
            .with_child(Collector::max());
        let mut pipeline = Pipeline::new(accumulation);

        pipeline.execute(&[vec![1.0, f64::NAN]]).unwrap();
        assert_eq!(pipeline.results().unwrap(), None);

        pipeline.execute(&[vec![2.0, f64::NAN]]).unwrap();
        pipeline.execute(&[vec![10.0, 1.0]]).unwrap();
        pipeline.execute(&[vec![f64::NAN, 2.0]]).unwrap();
        // A third, incomplete window never reaches the collector.
        pipeline.execute(&[vec![100.0, 100.0]]).unwrap();

        let results = pipeline.results().unwrap().unwrap();
        assert_cells_approx_eq!(results[0], vec![10.0, 3.0], 1e-12);
    }

    #[test]
    fn test_sum_accumulation_combined_mode() {
        let accumulation = SumAccumulation::new(1, AccumulationMode::Combined)
            .unwrap()
            .with_child(Collector::sum());
        let mut pipeline = Pipeline::new(accumulation);
        pipeline
            .execute(&[vec![1.0, f64::NAN], vec![2.0, f64::NAN]])
            .unwrap();
        let results = pipeline.results().unwrap().unwrap();
        assert_eq!(results.len(), 1);
        assert_cells_approx_eq!(results[0], vec![3.0, f64::NAN], 1e-12);
    }

    #[test]
    fn test_sum_accumulation_rejects_zero_window() {
        assert!(SumAccumulation::new(0, AccumulationMode::PerVariable).is_err());
    }
}
