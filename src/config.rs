//! Configuration for the rep counter.
//!
//! [`CounterConfig`] holds the constants the counting core needs (window size,
//! cadence, smoothing thresholds). [`Config`] wraps it together with the user
//! settings a companion app pushes to the device: the target rep count and
//! whether per-rep haptics are on.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Target rep count used when none has been stored.
pub const DEFAULT_TARGET_REPS: u32 = 10;

/// Slowest sensor rate the pipeline accepts, in Hz.
pub const MIN_SAMPLING_RATE_HZ: f64 = 1.0;

/// Main configuration for the rep counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core windowing and smoothing constants
    #[serde(default)]
    pub counter: CounterConfig,

    /// Number of reps that completes the set
    #[serde(default = "default_target_reps", deserialize_with = "target_reps_serde::deserialize")]
    pub target_reps: u32,

    /// Whether a haptic fires on every completed rep
    #[serde(default = "default_haptics")]
    pub haptics_enabled: bool,

    /// Path for storing cumulative statistics
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,
}

fn default_data_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rep-counter")
}

fn default_target_reps() -> u32 {
    DEFAULT_TARGET_REPS
}

fn default_haptics() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            counter: CounterConfig::default(),
            target_reps: DEFAULT_TARGET_REPS,
            haptics_enabled: true,
            data_path: default_data_path(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rep-counter")
            .join("config.json")
    }

    /// Path of the persisted cumulative statistics.
    pub fn stats_path(&self) -> PathBuf {
        self.data_path.join("stats.json")
    }

    /// Validate the whole configuration, including the core constants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_reps == 0 {
            return Err(ConfigError::Invalid(
                "target_reps must be at least 1".to_string(),
            ));
        }
        self.counter.validate()
    }
}

/// Constants of the sliding-window classification pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    /// Samples per classified window
    pub window_size: usize,
    /// Nominal sensor rate in Hz
    pub sampling_rate_hz: f64,
    /// Samples between consecutive classifications; the newest
    /// `window_size - overlap` samples carry over into the next window
    pub overlap: usize,
    /// Number of gated labels kept for debouncing
    pub history_size: usize,
    /// Minimum confidence of the classifier's top label
    pub confidence_threshold: f64,
    /// Target labels (out of `history_size`) needed to confirm a rep
    pub confirmation_threshold: usize,
    /// Classifier label that denotes the tracked exercise
    pub target_label: String,
    /// Length of the zeroed auxiliary state handed to the classifier
    pub aux_state_len: usize,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            window_size: 100,
            sampling_rate_hz: 50.0,
            overlap: 25,
            history_size: 5,
            confidence_threshold: 0.50,
            confirmation_threshold: 3,
            target_label: "bicep_curl".to_string(),
            aux_state_len: 400,
        }
    }
}

impl CounterConfig {
    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.window_size == 0 {
            return invalid("window_size must be greater than 0".to_string());
        }
        if self.overlap == 0 || self.overlap >= self.window_size {
            return invalid(format!(
                "overlap must satisfy 0 < overlap < window_size (got {} with window_size {})",
                self.overlap, self.window_size
            ));
        }
        let rate = self.sampling_rate_hz;
        if !(rate.is_finite() && rate >= MIN_SAMPLING_RATE_HZ) {
            return invalid(format!(
                "sampling_rate_hz must be at least {MIN_SAMPLING_RATE_HZ} (got {})",
                self.sampling_rate_hz
            ));
        }
        if self.history_size == 0 {
            return invalid("history_size must be greater than 0".to_string());
        }
        if self.confirmation_threshold == 0 || self.confirmation_threshold > self.history_size {
            return invalid(format!(
                "confirmation_threshold must be in 1..={} (got {})",
                self.history_size, self.confirmation_threshold
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return invalid(format!(
                "confidence_threshold must be within [0, 1] (got {})",
                self.confidence_threshold
            ));
        }
        if self.target_label.trim().is_empty() {
            return invalid("target_label must not be empty".to_string());
        }
        Ok(())
    }

    /// Seconds between two classifications.
    pub fn classification_interval_secs(&self) -> f64 {
        self.overlap as f64 / self.sampling_rate_hz
    }

    /// Seconds of signal covered by one window.
    pub fn window_duration_secs(&self) -> f64 {
        self.window_size as f64 / self.sampling_rate_hz
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Serialize error: {0}")]
    Serialize(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// A stored target of 0 means "never set" and reads back as the default.
mod target_reps_serde {
    use super::DEFAULT_TARGET_REPS;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let reps = u32::deserialize(deserializer)?;
        Ok(if reps == 0 { DEFAULT_TARGET_REPS } else { reps })
    }
}
