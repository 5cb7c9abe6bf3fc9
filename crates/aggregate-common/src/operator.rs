//! Summary operator definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::variable::VariableName;

/// Kind of aggregation a [`SummaryOperator`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorType {
    Mean,
    Sum,
    Min,
    Max,
    Range,
    Diff,
    Speed,
    ThresholdCount,
    ThresholdValue,
    ThresholdValueSquared,
}

impl OperatorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperatorType::Mean => "mean",
            OperatorType::Sum => "sum",
            OperatorType::Min => "min",
            OperatorType::Max => "max",
            OperatorType::Range => "range",
            OperatorType::Diff => "diff",
            OperatorType::Speed => "speed",
            OperatorType::ThresholdCount => "threshold_count",
            OperatorType::ThresholdValue => "threshold_value",
            OperatorType::ThresholdValueSquared => "threshold_value_squared",
        }
    }

    pub fn is_threshold(&self) -> bool {
        matches!(
            self,
            OperatorType::ThresholdCount
                | OperatorType::ThresholdValue
                | OperatorType::ThresholdValueSquared
        )
    }

    /// Number of result arrays produced per input variable.
    pub fn results_per_variable(&self) -> usize {
        match self {
            OperatorType::Range => 3,
            _ => 1,
        }
    }
}

impl std::fmt::Display for OperatorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Comparison used to decide threshold exceedance and running extrema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl Comparison {
    /// Returns true when `value` compares favourably against `reference`.
    ///
    /// Any comparison involving NaN is false.
    #[inline]
    pub fn test(&self, value: f64, reference: f64) -> bool {
        match self {
            Comparison::GreaterThan => value > reference,
            Comparison::GreaterThanOrEqual => value >= reference,
            Comparison::LessThan => value < reference,
            Comparison::LessThanOrEqual => value <= reference,
        }
    }
}

/// Threshold values, either one set for the whole grid or one per zone.
///
/// Each entry is a list so seasonally varying thresholds can be expressed;
/// only the first value is currently used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdValues {
    Global(Vec<f64>),
    PerZone(BTreeMap<String, Vec<f64>>),
}

/// Configuration of a threshold exceedance operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub comparison: Comparison,
    pub thresholds: ThresholdValues,
    /// Number of time slices averaged before comparison (e.g. 24 for a
    /// daily mean of hourly data). No pre-aggregation when absent.
    #[serde(default)]
    pub window: Option<usize>,
}

/// Metadata for one output variable of an operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputVariable {
    pub name: String,
    #[serde(default)]
    pub long_name: Option<String>,
    #[serde(default)]
    pub units: Option<String>,
}

impl OutputVariable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            long_name: None,
            units: None,
        }
    }
}

/// A configured aggregation over one or more input variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryOperator {
    #[serde(rename = "type")]
    pub operator_type: OperatorType,
    pub variables: Vec<VariableName>,
    pub outputs: Vec<OutputVariable>,
    #[serde(default)]
    pub threshold: Option<ThresholdConfig>,
}

impl SummaryOperator {
    pub fn new(
        operator_type: OperatorType,
        variables: Vec<VariableName>,
        outputs: Vec<OutputVariable>,
    ) -> Self {
        Self {
            operator_type,
            variables,
            outputs,
            threshold: None,
        }
    }

    pub fn with_threshold(mut self, threshold: ThresholdConfig) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Distinct input ids referenced by the variables, in first-seen order.
    pub fn input_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for variable in &self.variables {
            if !ids.contains(&variable.input_id()) {
                ids.push(variable.input_id());
            }
        }
        ids
    }

    /// Variables read from the given input, in configured order.
    pub fn variables_for_input<'a>(
        &'a self,
        input_id: &'a str,
    ) -> impl Iterator<Item = &'a VariableName> + 'a {
        self.variables
            .iter()
            .filter(move |variable| variable.input_id() == input_id)
    }

    /// Name used in logs and summary output.
    pub fn name(&self) -> &str {
        self.outputs
            .first()
            .map(|output| output.name.as_str())
            .unwrap_or_else(|| self.operator_type.as_str())
    }

    /// Check the operator is internally consistent.
    pub fn validate(&self) -> ModelResult<()> {
        if self.variables.is_empty() {
            return Err(ModelError::invalid(format!(
                "operator '{}' has no input variables",
                self.operator_type
            )));
        }

        match self.operator_type {
            OperatorType::Speed if self.variables.len() != 2 => {
                return Err(ModelError::invalid(format!(
                    "speed operator needs exactly 2 variables, got {}",
                    self.variables.len()
                )));
            }
            OperatorType::Diff if self.variables.len() != 2 => {
                return Err(ModelError::invalid(format!(
                    "diff operator needs exactly 2 variables, got {}",
                    self.variables.len()
                )));
            }
            t if t.is_threshold() => {
                let threshold = self.threshold.as_ref().ok_or_else(|| {
                    ModelError::invalid(format!("operator '{}' has no threshold configuration", t))
                })?;
                if threshold.window == Some(0) {
                    return Err(ModelError::invalid("threshold window must be > 0"));
                }
            }
            _ => {}
        }

        if self.outputs.is_empty() {
            return Err(ModelError::invalid(format!(
                "operator '{}' has no output variables",
                self.operator_type
            )));
        }

        Ok(())
    }
}
