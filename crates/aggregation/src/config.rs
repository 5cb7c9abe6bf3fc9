//! Configuration for aggregation runs.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AggregationError, Result};

/// Largest number of depths read in one chunk.
pub const MAX_DEPTHS_PER_CHUNK: usize = 4;

/// Configuration for the aggregation orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Depths read per chunk (1-4). Bounds memory per time slice.
    pub max_depths_per_chunk: usize,

    /// Replay monthly inputs once per calendar day when building annual
    /// means, weighting each month by its length.
    pub replay_monthly_days: bool,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            max_depths_per_chunk: MAX_DEPTHS_PER_CHUNK,
            replay_monthly_days: true,
        }
    }
}

impl AggregationConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("AGGREGATION_MAX_DEPTHS_PER_CHUNK") {
            if let Ok(depths) = val.parse() {
                config.max_depths_per_chunk = depths;
            }
        }

        if let Ok(val) = std::env::var("AGGREGATION_REPLAY_MONTHLY_DAYS") {
            config.replay_monthly_days = val.to_lowercase() == "true" || val == "1";
        }

        config
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AggregationError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_yaml::from_str(&contents).map_err(|e| {
            AggregationError::config(format!("failed to parse {}: {}", path.display(), e))
        })?;
        config.validate().map_err(AggregationError::config)?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.max_depths_per_chunk == 0 || self.max_depths_per_chunk > MAX_DEPTHS_PER_CHUNK {
            return Err(format!(
                "max_depths_per_chunk must be 1-{}, got {}",
                MAX_DEPTHS_PER_CHUNK, self.max_depths_per_chunk
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = AggregationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_depths_per_chunk, 4);
    }

    #[test]
    fn test_validate_depth_chunk_bounds() {
        for depths in [0, 5] {
            let config = AggregationConfig {
                max_depths_per_chunk: depths,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "{} depths", depths);
        }
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aggregation.yaml");
        std::fs::write(&path, "max_depths_per_chunk: 2\n").unwrap();
        let config = AggregationConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.max_depths_per_chunk, 2);
        assert!(config.replay_monthly_days);

        std::fs::write(&path, "max_depths_per_chunk: 9\n").unwrap();
        assert!(AggregationConfig::from_yaml_file(&path).is_err());
    }
}
