//! NaN-safe per-cell operators for temporal aggregation of gridded data.
//!
//! A [`Pipeline`] owns a tree of [`Stage`]s. Each time slice is pushed through
//! the tree with [`Pipeline::execute`]; intermediate stages transform the
//! arrays and forward them, and the [`Collector`] leaves accumulate. Once an
//! aggregation window is complete the collector results are read with
//! [`Pipeline::results`] and the tree is cleared with [`Pipeline::reset`].
//!
//! ```text
//! time slice ──► SumAccumulation(N) ──► Divide(N) ──► Threshold ──► Sum collector
//! ```
//!
//! A NaN cell means "no data": it contributes nothing, and a cell that has
//! received a valid value never becomes NaN again.
//!
//! # Example
//!
//! ```ignore
//! use stage_pipeline::build_pipeline;
//!
//! let mut pipeline = build_pipeline(&operator, None)?;
//! for slice in slices {
//!     pipeline.execute(&[slice])?;
//! }
//! let results = pipeline.results()?;
//! ```

pub mod cells;
pub mod collector;
pub mod error;
pub mod factory;
pub mod pipeline;
pub mod stage;
pub mod threshold;
pub mod transform;
pub mod zone;

// Re-export commonly used types at crate root
pub use cells::CellArray;
pub use collector::{
    Collector, DifferenceCollector, MeanCollector, MinMaxCollector, RangeCollector, SumCollector,
};
pub use error::{Result, StageError};
pub use factory::build_pipeline;
pub use pipeline::Pipeline;
pub use stage::Stage;
pub use threshold::{ExceedanceStrategy, ThresholdExceedance};
pub use transform::{AccumulationMode, Divide, Speed, Subtract, SumAccumulation};
pub use zone::{ZoneLookup, GLOBAL_ZONE};
