//! Configuration for regular grid mapping.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Weight given to a candidate that sits exactly on the output point.
pub const DEFAULT_ZERO_DISTANCE_WEIGHT: f64 = 999.0;

/// Configuration for mapper construction and caching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegridConfig {
    /// Weight of a zero-distance candidate in the weighted mean.
    pub zero_distance_weight: f64,

    /// Directory holding mapper cache files. Mappers are only kept in memory
    /// when absent.
    pub cache_dir: Option<PathBuf>,

    /// Number of mappers kept in memory.
    pub cache_capacity: usize,
}

impl Default for RegridConfig {
    fn default() -> Self {
        Self {
            zero_distance_weight: DEFAULT_ZERO_DISTANCE_WEIGHT,
            cache_dir: None,
            cache_capacity: 4,
        }
    }
}

impl RegridConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("REGRID_ZERO_DISTANCE_WEIGHT") {
            if let Ok(weight) = val.parse() {
                config.zero_distance_weight = weight;
            }
        }

        if let Ok(val) = std::env::var("REGRID_CACHE_DIR") {
            if !val.is_empty() {
                config.cache_dir = Some(PathBuf::from(val));
            }
        }

        if let Ok(val) = std::env::var("REGRID_CACHE_CAPACITY") {
            if let Ok(capacity) = val.parse() {
                config.cache_capacity = capacity;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.zero_distance_weight.is_finite() && self.zero_distance_weight > 0.0) {
            return Err(format!(
                "zero_distance_weight must be finite and > 0, got {}",
                self.zero_distance_weight
            ));
        }

        if self.cache_capacity == 0 {
            return Err("cache_capacity must be > 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = RegridConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.zero_distance_weight, 999.0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = RegridConfig {
            zero_distance_weight: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = RegridConfig {
            cache_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
