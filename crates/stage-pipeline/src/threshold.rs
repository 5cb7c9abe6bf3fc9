//! Threshold exceedance stage.
//!
//! One algorithm serves the count, value and squared-value operators; the
//! [`ExceedanceStrategy`] picks what an exceeding cell contributes.

use std::collections::BTreeMap;
use std::sync::Arc;

use aggregate_common::{Comparison, OperatorType, ThresholdValues};

use crate::cells::CellArray;
use crate::error::{Result, StageError};
use crate::stage::{forward, Stage};
use crate::zone::{ZoneLookup, GLOBAL_ZONE};

/// What an exceeding cell contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceedanceStrategy {
    /// 1.0 per exceedance
    Count,
    /// `|value - threshold|`
    Value,
    /// `(value - threshold)²`
    ValueSquared,
}

impl ExceedanceStrategy {
    /// Strategy for a threshold operator type.
    pub fn for_operator(operator: OperatorType) -> Option<Self> {
        match operator {
            OperatorType::ThresholdCount => Some(ExceedanceStrategy::Count),
            OperatorType::ThresholdValue => Some(ExceedanceStrategy::Value),
            OperatorType::ThresholdValueSquared => Some(ExceedanceStrategy::ValueSquared),
            _ => None,
        }
    }

    /// Contribution of `value` against `threshold` under `comparison`.
    ///
    /// NaN when the value or threshold is missing, 0.0 without exceedance.
    #[inline]
    pub fn exceedance(&self, comparison: Comparison, value: f64, threshold: f64) -> f64 {
        if value.is_nan() || threshold.is_nan() {
            return f64::NAN;
        }
        if !comparison.test(value, threshold) {
            return 0.0;
        }
        match self {
            ExceedanceStrategy::Count => 1.0,
            ExceedanceStrategy::Value => (value - threshold).abs(),
            ExceedanceStrategy::ValueSquared => (value - threshold).powi(2),
        }
    }
}

/// Compares each cell with the threshold of its zone.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdExceedance {
    strategy: ExceedanceStrategy,
    comparison: Comparison,
    zones: Arc<ZoneLookup>,
    /// Threshold per zone number
    thresholds: Vec<f64>,
    children: Vec<Stage>,
}

impl ThresholdExceedance {
    /// Build the stage, resolving one threshold per zone.
    ///
    /// Global thresholds use a global lookup. Per-zone thresholds need a
    /// lookup, and every zone it can resolve needs a threshold entry.
    pub fn new(
        strategy: ExceedanceStrategy,
        comparison: Comparison,
        values: &ThresholdValues,
        zones: Option<Arc<ZoneLookup>>,
    ) -> Result<Self> {
        let (zones, thresholds) = match values {
            ThresholdValues::Global(values) => {
                let threshold = first_threshold(values)
                    .ok_or_else(|| StageError::MissingThreshold(GLOBAL_ZONE.to_string()))?;
                (Arc::new(ZoneLookup::global()), vec![threshold])
            }
            ThresholdValues::PerZone(map) => {
                let zones = zones.ok_or(StageError::MissingZoneLookup)?;
                let thresholds = resolve_zone_thresholds(&zones, map)?;
                (zones, thresholds)
            }
        };

        Ok(Self {
            strategy,
            comparison,
            zones,
            thresholds,
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

    pub fn strategy(&self) -> ExceedanceStrategy {
        self.strategy
    }

    /// Exceedance of every cell of one array.
    pub fn apply(&self, values: &[f64]) -> CellArray {
        values
            .iter()
            .enumerate()
            .map(|(index, &value)| match self.zones.zone_of(index) {
                Some(zone) => self
                    .strategy
                    .exceedance(self.comparison, value, self.thresholds[zone]),
                None => f64::NAN,
            })
            .collect()
    }

    pub fn execute(&mut self, inputs: &[CellArray]) -> Result<()> {
        let exceedances: Vec<CellArray> = inputs.iter().map(|array| self.apply(array)).collect();
        forward(&mut self.children, &exceedances)
    }

    pub fn reset(&mut self) {
        self.children.iter_mut().for_each(Stage::reset);
    }
}

/// Seasonal thresholds are configured as lists; only the first is used.
fn first_threshold(values: &[f64]) -> Option<f64> {
    values.first().copied()
}

fn resolve_zone_thresholds(
    zones: &ZoneLookup,
    map: &BTreeMap<String, Vec<f64>>,
) -> Result<Vec<f64>> {
    zones
        .zone_names()
        .iter()
        .map(|zone| {
            map.get(zone)
                .and_then(|values| first_threshold(values))
                .ok_or_else(|| StageError::MissingThreshold(zone.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exceedance_strategies() {
        let cmp = Comparison::GreaterThan;
        assert_eq!(ExceedanceStrategy::Count.exceedance(cmp, 3.0, 2.0), 1.0);
        assert_eq!(ExceedanceStrategy::Count.exceedance(cmp, 2.0, 2.0), 0.0);
        assert_eq!(ExceedanceStrategy::Value.exceedance(cmp, 3.5, 2.0), 1.5);
        assert_eq!(ExceedanceStrategy::ValueSquared.exceedance(cmp, 3.5, 2.0), 2.25);
        assert!(ExceedanceStrategy::Count.exceedance(cmp, f64::NAN, 2.0).is_nan());

        let below = Comparison::LessThan;
        assert_eq!(ExceedanceStrategy::Value.exceedance(below, 1.0, 2.5), 1.5);
    }

    #[test]
    fn test_cell_without_zone_is_nan() {
        let zones = Arc::new(ZoneLookup::from_cells(&[Some("a"), None]));
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), vec![1.0, 5.0]);
        let stage = ThresholdExceedance::new(
            ExceedanceStrategy::Count,
            Comparison::GreaterThan,
            &ThresholdValues::PerZone(map),
            Some(zones),
        )
        .unwrap();

        let out = stage.apply(&[2.0, 2.0, 0.5, 2.0]);
        assert_eq!(out[0], 1.0);
        assert!(out[1].is_nan());
        assert_eq!(out[2], 0.0);
        assert!(out[3].is_nan());
    }

    #[test]
    fn test_missing_zone_threshold_is_rejected() {
        let zones = Arc::new(ZoneLookup::from_cells(&[Some("a"), Some("b")]));
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), vec![1.0]);
        let err = ThresholdExceedance::new(
            ExceedanceStrategy::Count,
            Comparison::GreaterThan,
            &ThresholdValues::PerZone(map),
            Some(zones),
        )
        .unwrap_err();
        assert_eq!(err, StageError::MissingThreshold("b".to_string()));
    }

    #[test]
    fn test_per_zone_thresholds_require_lookup() {
        let err = ThresholdExceedance::new(
            ExceedanceStrategy::Value,
            Comparison::GreaterThan,
            &ThresholdValues::PerZone(BTreeMap::new()),
            None,
        )
        .unwrap_err();
        assert_eq!(err, StageError::MissingZoneLookup);
    }

    #[test]
    fn test_empty_global_threshold_is_rejected() {
        let err = ThresholdExceedance::new(
            ExceedanceStrategy::Count,
            Comparison::GreaterThan,
            &ThresholdValues::Global(vec![]),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, StageError::MissingThreshold(_)));
    }
}
