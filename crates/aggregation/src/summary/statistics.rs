use serde::{Deserialize, Serialize};

/// Statistics of one zone or site bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub p5: f64,
    pub p95: f64,
    pub min: f64,
    pub max: f64,
}

impl SummaryStatistics {
    /// Statistics of the valid samples. `None` when there are none.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = samples.iter().copied().filter(|v| !v.is_nan()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        Some(Self {
            count,
            mean,
            median: percentile(&sorted, 50.0),
            p5: percentile(&sorted, 5.0),
            p95: percentile(&sorted, 95.0),
            min: sorted[0],
            max: sorted[count - 1],
        })
    }
}

/// Percentile `p` (0-100] of ascending `sorted` values.
///
/// Position `p * (n + 1) / 100`, clamped to the first and last value and
/// linearly interpolated in between.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    let position = p * (n as f64 + 1.0) / 100.0;
    if position < 1.0 {
        return sorted[0];
    }
    if position >= n as f64 {
        return sorted[n - 1];
    }
    let lower = position.floor();
    let fraction = position - lower;
    let lower = lower as usize;
    sorted[lower - 1] + fraction * (sorted[lower] - sorted[lower - 1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::assert_approx_eq;

    #[test]
    fn test_statistics_of_one_to_ten() {
        let samples: Vec<f64> = (1..=10).map(f64::from).collect();
        let stats = SummaryStatistics::from_samples(&samples).unwrap();
        assert_eq!(stats.count, 10);
        assert_approx_eq!(stats.mean, 5.5, 1e-12);
        assert_approx_eq!(stats.median, 5.5, 1e-12);
        assert_eq!(stats.p5, 1.0);
        assert_eq!(stats.p95, 10.0);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 10.0);
    }

    #[test]
    fn test_percentile_interpolates() {
        let samples: Vec<f64> = (1..=100).map(f64::from).collect();
        // position 0.05 * 101 = 5.05
        assert_approx_eq!(percentile(&samples, 5.0), 5.05, 1e-9);
        // position 0.95 * 101 = 95.95
        assert_approx_eq!(percentile(&samples, 95.0), 95.95, 1e-9);
    }

    #[test]
    fn test_nan_samples_are_ignored() {
        let stats = SummaryStatistics::from_samples(&[f64::NAN, 3.0, 1.0, f64::NAN]).unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.median, 2.0);
        assert!(SummaryStatistics::from_samples(&[f64::NAN]).is_none());
        assert!(SummaryStatistics::from_samples(&[]).is_none());
    }
}
