use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clustering::RegistryPolicy;
use crate::environment::get_env_var_or;
use crate::error::ConfigError;
use crate::TARGET_PIPELINE;

pub const SIMILARITY_THRESHOLD_ENV: &str = "ARGUS_SIMILARITY_THRESHOLD";
pub const MIN_MEMBERS_ENV: &str = "ARGUS_MIN_MEMBERS";
pub const RETENTION_DAYS_ENV: &str = "ARGUS_RETENTION_DAYS";
pub const MAX_PARALLEL_EVENTS_ENV: &str = "ARGUS_MAX_PARALLEL_EVENTS";
pub const HISTORY_LIMIT_ENV: &str = "ARGUS_HISTORY_LIMIT";

/// Minimum cosine similarity for two articles to describe the same event
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.70;

/// Minimum members before a group of articles counts as an event
pub const DEFAULT_MIN_MEMBERS: usize = 2;

/// Days an unpromoted candidate (or a quiet event) is kept before it expires (or goes dormant)
pub const DEFAULT_RETENTION_DAYS: i64 = 14;

pub const DEFAULT_MAX_PARALLEL_EVENTS: usize = 4;

/// Number of similar historical events attached to each prediction
pub const DEFAULT_HISTORY_LIMIT: usize = 3;

/// Tunables for one analysis pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub similarity_threshold: f32,
    pub min_members: usize,
    pub retention_days: i64,
    pub max_parallel_events: usize,
    pub history_limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            min_members: DEFAULT_MIN_MEMBERS,
            retention_days: DEFAULT_RETENTION_DAYS,
            max_parallel_events: DEFAULT_MAX_PARALLEL_EVENTS,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl PipelineConfig {
    /// Builds a configuration from `ARGUS_*` environment variables, using the
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            similarity_threshold: get_env_var_or(
                SIMILARITY_THRESHOLD_ENV,
                DEFAULT_SIMILARITY_THRESHOLD,
            )?,
            min_members: get_env_var_or(MIN_MEMBERS_ENV, DEFAULT_MIN_MEMBERS)?,
            retention_days: get_env_var_or(RETENTION_DAYS_ENV, DEFAULT_RETENTION_DAYS)?,
            max_parallel_events: get_env_var_or(
                MAX_PARALLEL_EVENTS_ENV,
                DEFAULT_MAX_PARALLEL_EVENTS,
            )?,
            history_limit: get_env_var_or(HISTORY_LIMIT_ENV, DEFAULT_HISTORY_LIMIT)?,
        };
        config.validate()?;

        info!(
            target: TARGET_PIPELINE,
            "Loaded pipeline config: threshold={:.2}, min_members={}, retention={}d, parallel={}",
            config.similarity_threshold,
            config.min_members,
            config.retention_days,
            config.max_parallel_events
        );

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.similarity_threshold > 0.0 && self.similarity_threshold <= 1.0) {
            return Err(ConfigError::SimilarityThreshold(self.similarity_threshold));
        }
        if self.min_members == 0 {
            return Err(ConfigError::NotPositive("min_members"));
        }
        if self.retention_days <= 0 {
            return Err(ConfigError::NotPositive("retention_days"));
        }
        if self.max_parallel_events == 0 {
            return Err(ConfigError::NotPositive("max_parallel_events"));
        }
        Ok(())
    }

    pub fn retention(&self) -> Duration {
        Duration::days(self.retention_days)
    }

    pub fn registry_policy(&self) -> RegistryPolicy {
        RegistryPolicy {
            min_members: self.min_members,
            retention: self.retention(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.similarity_threshold, 0.70);
        assert_eq!(config.min_members, 2);
        assert_eq!(config.registry_policy().retention, Duration::days(14));
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let config = PipelineConfig {
            similarity_threshold: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SimilarityThreshold(_))
        ));

        let config = PipelineConfig {
            min_members: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive("min_members"))
        ));
    }
}
