//! Common types shared across the ocean-aggregate workspace.
//!
//! Everything in here is configuration: it is loaded once per task and is
//! immutable while the task runs.

pub mod error;
pub mod operator;
pub mod task;
pub mod time;
pub mod variable;

pub use error::{ModelError, ModelResult};
pub use operator::{
    Comparison, OperatorType, OutputVariable, SummaryOperator, ThresholdConfig, ThresholdValues,
};
pub use task::{
    FileIndexBounds, Input, InputDefinition, ProductDefinition, SummaryKind, Task, TimeInstant,
};
pub use time::{days_in_month, AggregationPeriod, TimeIncrement};
pub use variable::VariableName;
