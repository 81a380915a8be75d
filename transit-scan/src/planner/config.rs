//! Scan configuration.

use std::path::Path;

use chrono::Duration;
use serde::Deserialize;

/// Error loading a [`ScanConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Configuration parameters shared by the scans and transfer generators.
///
/// Missing fields in a config file take their default value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Minimum time to change vehicles within one stop (seconds).
    pub min_transfer_secs: u32,

    /// Longest walk allowed at either end of a journey (seconds).
    pub max_walk_secs: u32,

    /// Walking speed for footpaths estimated from coordinates.
    pub walking_speed_mps: f64,

    /// Longest footpath estimated from coordinates (metres).
    pub max_walk_distance_m: f64,

    /// Maximum number of journeys returned by a profile query.
    pub max_results: usize,

    /// Entries kept by memoizing transfer generators.
    pub transfer_cache_capacity: u64,
}

impl ScanConfig {
    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Returns the minimum transfer time as a Duration.
    pub fn min_transfer(&self) -> Duration {
        Duration::seconds(i64::from(self.min_transfer_secs))
    }

    /// Returns the maximum endpoint walk as a Duration.
    pub fn max_walk(&self) -> Duration {
        Duration::seconds(i64::from(self.max_walk_secs))
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            min_transfer_secs: 180,
            max_walk_secs: 900,
            walking_speed_mps: 1.4,
            max_walk_distance_m: 500.0,
            max_results: 10,
            transfer_cache_capacity: 10_000,
        }
    }
}
