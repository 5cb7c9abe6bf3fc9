//! Time handling for aggregation periods and input increments.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Spacing between consecutive time slices of an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeIncrement {
    Hourly,
    Daily,
    Monthly,
    Annual,
}

impl TimeIncrement {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeIncrement::Hourly => "hourly",
            TimeIncrement::Daily => "daily",
            TimeIncrement::Monthly => "monthly",
            TimeIncrement::Annual => "annual",
        }
    }
}

impl std::fmt::Display for TimeIncrement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Length of the window a product aggregates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationPeriod {
    Daily,
    Monthly,
    Seasonal,
    Annual,
    /// The whole time range of the task collapses into one value.
    All,
}

impl AggregationPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationPeriod::Daily => "daily",
            AggregationPeriod::Monthly => "monthly",
            AggregationPeriod::Seasonal => "seasonal",
            AggregationPeriod::Annual => "annual",
            AggregationPeriod::All => "all",
        }
    }
}

impl std::fmt::Display for AggregationPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Number of calendar days in the month containing `time`.
pub fn days_in_month(time: &DateTime<Utc>) -> u32 {
    let (year, month) = (time.year(), time.month());
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    // Both dates are the first of a month, which always exists.
    match (
        NaiveDate::from_ymd_opt(year, month, 1),
        NaiveDate::from_ymd_opt(next_year, next_month, 1),
    ) {
        (Some(start), Some(end)) => (end - start).num_days() as u32,
        _ => 30,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_days_in_month() {
        let jan = Utc.with_ymd_and_hms(2023, 1, 16, 12, 0, 0).unwrap();
        let feb = Utc.with_ymd_and_hms(2023, 2, 14, 0, 0, 0).unwrap();
        let feb_leap = Utc.with_ymd_and_hms(2024, 2, 14, 0, 0, 0).unwrap();
        let apr = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        let dec = Utc.with_ymd_and_hms(2024, 12, 31, 23, 0, 0).unwrap();

        assert_eq!(days_in_month(&jan), 31);
        assert_eq!(days_in_month(&feb), 28);
        assert_eq!(days_in_month(&feb_leap), 29);
        assert_eq!(days_in_month(&apr), 30);
        assert_eq!(days_in_month(&dec), 31);
    }

    #[test]
    fn test_period_serde() {
        let period: AggregationPeriod = serde_yaml::from_str("annual").unwrap();
        assert_eq!(period, AggregationPeriod::Annual);
        let increment: TimeIncrement = serde_yaml::from_str("monthly").unwrap();
        assert_eq!(increment, TimeIncrement::Monthly);
    }
}
