//! Runtime configuration loaded from YAML

use crate::analytics::{AnalyticsConfig, ThresholdError};
use crate::derived::DEFAULT_HUB_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid analytics threshold: {0}")]
    Threshold(#[from] ThresholdError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Incident relationship count at which a disease becomes a hub
    pub hub_threshold: usize,
    /// Thresholds, limits and resource cost multipliers of the analyses
    pub analytics: AnalyticsConfig,
    /// Where snapshots are written (None = in-memory only)
    pub snapshot_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hub_threshold: DEFAULT_HUB_THRESHOLD,
            analytics: AnalyticsConfig::default(),
            snapshot_path: None,
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.hub_threshold == 0 {
            return Err(ConfigError::Invalid("hub_threshold must be at least 1".to_string()));
        }
        Ok(self.analytics.validate()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml_str(
            "hub_threshold: 4\nanalytics:\n  pathway_min_strength: 0.7\n  resources:\n    cost_per_point: 300.0\n",
        )
        .unwrap();
        assert_eq!(config.hub_threshold, 4);
        assert_eq!(config.analytics.pathway_min_strength, 0.7);
        assert_eq!(config.analytics.resources.cost_per_point, 300.0);
        assert_eq!(config.analytics.resources.high_weight, 4.0);
        assert_eq!(config.analytics.cascade_min_origins, 2);
        assert_eq!(config.snapshot_path, None);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = Config::from_yaml_str("analytics:\n  resources:\n    cost_per_point: -5.0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Threshold(ThresholdError::Negative { name: "cost_per_point", .. })
        ));
        let err = Config::from_yaml_str("analytics:\n  cascade_min_strength: 1.5\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Threshold(ThresholdError::OutOfUnitRange { name: "cascade_min_strength", .. })
        ));
        let err = Config::from_yaml_str("hub_threshold: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = Config::default();
        let parsed = Config::from_yaml_str(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_yaml_file("/nonexistent/multimorbidity.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
