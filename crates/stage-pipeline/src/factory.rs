//! Builds the stage tree for a configured summary operator.

use std::sync::Arc;

use aggregate_common::{OperatorType, SummaryOperator};
use tracing::debug;

use crate::collector::Collector;
use crate::error::{Result, StageError};
use crate::pipeline::Pipeline;
use crate::stage::Stage;
use crate::threshold::{ExceedanceStrategy, ThresholdExceedance};
use crate::transform::{AccumulationMode, Divide, Speed, SumAccumulation};
use crate::zone::ZoneLookup;

/// Build the pipeline for `operator`.
///
/// | operator      | stages                                                   |
/// |---------------|----------------------------------------------------------|
/// | mean, sum     | mean / sum collector                                     |
/// | min, max      | min / max collector                                      |
/// | range         | range collector                                          |
/// | diff          | difference collector                                     |
/// | speed         | speed -> mean collector                                  |
/// | threshold_*   | [sum accumulation(N) -> divide(N)] -> threshold -> sum   |
///
/// `zones` is only consulted by threshold operators with per-zone values.
pub fn build_pipeline(
    operator: &SummaryOperator,
    zones: Option<Arc<ZoneLookup>>,
) -> Result<Pipeline> {
    let entry: Stage = match operator.operator_type {
        OperatorType::Mean => Collector::mean().into(),
        OperatorType::Sum => Collector::sum().into(),
        OperatorType::Min => Collector::min().into(),
        OperatorType::Max => Collector::max().into(),
        OperatorType::Range => Collector::range().into(),
        OperatorType::Diff => Collector::difference().into(),
        OperatorType::Speed => Speed::new().with_child(Collector::mean()).into(),
        OperatorType::ThresholdCount
        | OperatorType::ThresholdValue
        | OperatorType::ThresholdValueSquared => threshold_stages(operator, zones)?,
    };

    let pipeline = Pipeline::new(entry);
    debug!(
        operator = %operator.operator_type,
        entry = pipeline.entry().name(),
        collectors = pipeline.collector_count(),
        "Built stage pipeline"
    );
    Ok(pipeline)
}

fn threshold_stages(operator: &SummaryOperator, zones: Option<Arc<ZoneLookup>>) -> Result<Stage> {
    let strategy = ExceedanceStrategy::for_operator(operator.operator_type).ok_or_else(|| {
        StageError::invalid_config(format!(
            "'{}' is not a threshold operator",
            operator.operator_type
        ))
    })?;
    let config = operator.threshold.as_ref().ok_or_else(|| {
        StageError::invalid_config(format!(
            "operator '{}' has no threshold configuration",
            operator.name()
        ))
    })?;

    let threshold = ThresholdExceedance::new(strategy, config.comparison, &config.thresholds, zones)?
        .with_child(Collector::sum());

    match config.window {
        None => Ok(threshold.into()),
        Some(window) => {
            let mean = Divide::new(window as f64)?.with_child(threshold);
            Ok(SumAccumulation::new(window, AccumulationMode::PerVariable)?
                .with_child(mean)
                .into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aggregate_common::{Comparison, OutputVariable, ThresholdConfig, ThresholdValues, VariableName};
    use std::collections::BTreeMap;
    use test_utils::{assert_cells_approx_eq, four_slice};

    fn operator(operator_type: OperatorType, variables: &[&str]) -> SummaryOperator {
        SummaryOperator::new(
            operator_type,
            variables
                .iter()
                .map(|v| VariableName::parse(v).unwrap())
                .collect(),
            vec![OutputVariable::new("out")],
        )
    }

    fn threshold_operator(values: ThresholdValues, window: Option<usize>) -> SummaryOperator {
        operator(OperatorType::ThresholdCount, &["hydro::temp"]).with_threshold(ThresholdConfig {
            comparison: Comparison::GreaterThan,
            thresholds: values,
            window,
        })
    }

    fn run(pipeline: &mut Pipeline) -> Vec<Vec<f64>> {
        for slice in four_slice::slices() {
            pipeline.execute(&[slice]).unwrap();
        }
        pipeline.results().unwrap().unwrap()
    }

    #[test]
    fn test_mean_over_fixture() {
        let mut pipeline = build_pipeline(&operator(OperatorType::Mean, &["hydro::temp"]), None).unwrap();
        let results = run(&mut pipeline);
        assert_eq!(results.len(), 1);
        assert_cells_approx_eq!(results[0], four_slice::MEAN, 1e-9);
        assert_cells_approx_eq!(results[0][1..2], [2.35], 1e-9);
    }

    #[test]
    fn test_reset_and_replay_is_idempotent() {
        for operator_type in [
            OperatorType::Mean,
            OperatorType::Sum,
            OperatorType::Min,
            OperatorType::Max,
            OperatorType::Range,
        ] {
            let mut pipeline = build_pipeline(&operator(operator_type, &["hydro::temp"]), None).unwrap();
            let first = run(&mut pipeline);
            pipeline.reset();
            assert_eq!(pipeline.results().unwrap(), None);
            let second = run(&mut pipeline);
            assert_eq!(first.len(), second.len());
            for (a, b) in first.iter().zip(&second) {
                assert_cells_approx_eq!(a, b, 0.0);
            }
        }
    }

    #[test]
    fn test_extrema_over_fixture() {
        let mut min = build_pipeline(&operator(OperatorType::Min, &["hydro::temp"]), None).unwrap();
        let mut max = build_pipeline(&operator(OperatorType::Max, &["hydro::temp"]), None).unwrap();
        assert_cells_approx_eq!(run(&mut min)[0], four_slice::MIN, 1e-12);
        assert_cells_approx_eq!(run(&mut max)[0], four_slice::MAX, 1e-12);
    }

    #[test]
    fn test_sum_over_fixture() {
        let mut sum = build_pipeline(&operator(OperatorType::Sum, &["hydro::temp"]), None).unwrap();
        assert_cells_approx_eq!(run(&mut sum)[0], four_slice::SUM, 1e-9);
    }

    #[test]
    fn test_speed_pipeline_averages() {
        let mut pipeline =
            build_pipeline(&operator(OperatorType::Speed, &["hydro::u", "hydro::v"]), None).unwrap();
        pipeline.execute(&[vec![3.0], vec![-4.0]]).unwrap();
        pipeline.execute(&[vec![6.0], vec![8.0]]).unwrap();
        let results = pipeline.results().unwrap().unwrap();
        assert_cells_approx_eq!(results[0], [7.5], 1e-12);
    }

    #[test]
    fn test_global_threshold_count() {
        let op = threshold_operator(ThresholdValues::Global(vec![2.0]), None);
        let mut pipeline = build_pipeline(&op, None).unwrap();
        let results = run(&mut pipeline);
        assert_cells_approx_eq!(results[0], four_slice::COUNT_ABOVE_2, 1e-12);
    }

    #[test]
    fn test_per_zone_threshold_changes_only_differing_zone() {
        let cells: Vec<Option<&str>> = four_slice::ZONES.iter().map(|z| Some(*z)).collect();
        let zones = Arc::new(ZoneLookup::from_cells(&cells));

        let mut same = BTreeMap::new();
        same.insert("north".to_string(), vec![2.0]);
        same.insert("south".to_string(), vec![2.0]);
        let op = threshold_operator(ThresholdValues::PerZone(same), None);
        let mut pipeline = build_pipeline(&op, Some(zones.clone())).unwrap();
        assert_cells_approx_eq!(run(&mut pipeline)[0], four_slice::COUNT_ABOVE_2, 1e-12);

        let mut differing = BTreeMap::new();
        differing.insert("north".to_string(), vec![2.0]);
        differing.insert("south".to_string(), vec![3.0, 1.0]);
        let op = threshold_operator(ThresholdValues::PerZone(differing), None);
        let mut pipeline = build_pipeline(&op, Some(zones)).unwrap();
        let results = run(&mut pipeline);
        assert_cells_approx_eq!(results[0], four_slice::COUNT_ZONED, 1e-12);

        for cell in 0..four_slice::CELLS {
            let zone = four_slice::ZONES[cell % four_slice::LAYER_CELLS];
            if zone == "north" {
                let (a, b) = (results[0][cell], four_slice::COUNT_ABOVE_2[cell]);
                assert!(a == b || (a.is_nan() && b.is_nan()), "cell {}", cell);
            }
        }
    }

    #[test]
    fn test_threshold_window_compares_window_means() {
        // Window means: slices 0+1 and slices 2+3, divided by 2.
        let op = threshold_operator(ThresholdValues::Global(vec![2.0]), Some(2));
        let mut pipeline = build_pipeline(&op, None).unwrap();
        let results = run(&mut pipeline);
        // cell 0: means 1.7, 1.8 -> 0; cell 1: 0.5, 4.2 -> 1; cell 3: 3.5, 1.5 -> 1
        // cell 6: 3.0, 2.25 -> 2; cell 5: NaN, 3.5 -> 1
        assert_cells_approx_eq!(
            results[0],
            [0.0, 1.0, f64::NAN, 1.0, 0.0, 1.0, 2.0, 0.0],
            1e-12
        );
    }

    #[test]
    fn test_threshold_without_config_fails() {
        let op = operator(OperatorType::ThresholdValue, &["hydro::temp"]);
        assert!(matches!(
            build_pipeline(&op, None).unwrap_err(),
            StageError::InvalidConfig(_)
        ));
    }

    #[test]
    fn test_range_pipeline_produces_three_arrays() {
        let mut pipeline = build_pipeline(&operator(OperatorType::Range, &["hydro::temp"]), None).unwrap();
        let results = run(&mut pipeline);
        assert_eq!(results.len(), OperatorType::Range.results_per_variable());
        assert_cells_approx_eq!(results[2], [2.4, 4.2, f64::NAN, 3.0, 1.5, 0.0, 2.0, 3.0], 1e-9);
    }
}
