//! Configuration loading traits and types.
//!
//! This module provides the rig configuration (`RigConfig`) and a
//! standardized way to load it from TOML.
//!
//! # Usage
//!
//! ```rust,no_run
//! use gearbox_common::config::{ConfigError, RigConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = RigConfig::load_validated(Path::new("config/rig.toml"))?;
//!     println!("Shift table: {:?}", config.gearbox.shift_degrees);
//!     Ok(())
//! }
//! ```
//!
//! # TOML Example
//!
//! ```toml
//! log_level = "debug"
//!
//! [gearbox]
//! shift_degrees = [120.0, 105.0, 110.0, 100.0]
//! backlash_degrees = 20.0
//! shift_power = 30
//!
//! [drive]
//! power = -100
//!
//! [driver_config.simulation]
//! io_latency_us = 10000
//! ```

use crate::consts::{
    DEFAULT_BACKLASH_DEGREES, DEFAULT_DRIVE_POWER, DEFAULT_MIN_SAMPLES, DEFAULT_SHIFT_DEGREES,
    DEFAULT_SHIFT_POWER, DEFAULT_SPEED_INTERVAL_S, DEFAULT_TONE_HZ, DEFAULT_TONE_MS, GEAR_PAIRS,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Error type for configuration loading operations.
///
/// This enum represents all possible errors that can occur when loading
/// configuration files.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, per-tick sample tracing.
    Trace,
    /// Per-shift detail.
    Debug,
    /// Lifecycle, gear changes and analysis summaries.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

fn default_shift_degrees() -> [f64; GEAR_PAIRS] {
    DEFAULT_SHIFT_DEGREES
}

fn default_backlash_degrees() -> f64 {
    DEFAULT_BACKLASH_DEGREES
}

fn default_shift_power() -> i8 {
    DEFAULT_SHIFT_POWER
}

fn default_drive_power() -> i8 {
    DEFAULT_DRIVE_POWER
}

fn default_speed_interval_s() -> f64 {
    DEFAULT_SPEED_INTERVAL_S
}

fn default_min_samples() -> usize {
    DEFAULT_MIN_SAMPLES
}

fn default_tone_hz() -> u32 {
    DEFAULT_TONE_HZ
}

fn default_tone_ms() -> u32 {
    DEFAULT_TONE_MS
}

/// Gear selection mechanics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GearboxConfig {
    /// Shift motor travel per gear pair (1↔2, 2↔3, 3↔4, 4↔5) [degrees].
    #[serde(default = "default_shift_degrees")]
    pub shift_degrees: [f64; GEAR_PAIRS],

    /// Extra travel added when the shift direction reverses [degrees].
    #[serde(default = "default_backlash_degrees")]
    pub backlash_degrees: f64,

    /// Shift motor power magnitude (0, 100].
    #[serde(default = "default_shift_power")]
    pub shift_power: i8,

    /// Shift completion timeout [ms]. 0 waits forever.
    #[serde(default)]
    pub shift_timeout_ms: u64,
}

impl Default for GearboxConfig {
    fn default() -> Self {
        Self {
            shift_degrees: default_shift_degrees(),
            backlash_degrees: default_backlash_degrees(),
            shift_power: default_shift_power(),
            shift_timeout_ms: 0,
        }
    }
}

impl GearboxConfig {
    /// Shift completion timeout, `None` when disabled.
    pub fn shift_timeout(&self) -> Option<Duration> {
        (self.shift_timeout_ms > 0).then(|| Duration::from_millis(self.shift_timeout_ms))
    }
}

/// Output shaft drive motor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DriveConfig {
    /// Continuous drive power [-100, 100], non-zero.
    #[serde(default = "default_drive_power")]
    pub power: i8,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            power: default_drive_power(),
        }
    }
}

/// Speed sampling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamplerConfig {
    /// Minimum time between two drive speed measurements [s].
    #[serde(default = "default_speed_interval_s")]
    pub speed_interval_s: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            speed_interval_s: default_speed_interval_s(),
        }
    }
}

/// Light signal spectral analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyzerConfig {
    /// Analysis requires strictly more samples than this.
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            min_samples: default_min_samples(),
        }
    }
}

/// Audible shift confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeedbackConfig {
    /// Tone frequency [Hz].
    #[serde(default = "default_tone_hz")]
    pub tone_hz: u32,

    /// Tone duration [ms].
    #[serde(default = "default_tone_ms")]
    pub tone_ms: u32,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            tone_hz: default_tone_hz(),
            tone_ms: default_tone_ms(),
        }
    }
}

/// Touch sensor handling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputConfig {
    /// Pause between polls inside a debounce wait [µs]. 0 polls back to back.
    #[serde(default)]
    pub debounce_poll_us: u64,
}

impl InputConfig {
    /// Pause between debounce polls.
    pub fn debounce_poll(&self) -> Duration {
        Duration::from_micros(self.debounce_poll_us)
    }
}

/// Main configuration loaded from `rig.toml`.
///
/// Every section is optional; an empty file yields the reference rig.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RigConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Gear selection mechanics.
    #[serde(default)]
    pub gearbox: GearboxConfig,

    /// Output shaft drive.
    #[serde(default)]
    pub drive: DriveConfig,

    /// Speed sampling.
    #[serde(default)]
    pub sampler: SamplerConfig,

    /// Spectral analysis.
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Shift confirmation tone.
    #[serde(default)]
    pub feedback: FeedbackConfig,

    /// Touch sensor handling.
    #[serde(default)]
    pub input: InputConfig,

    /// Per-driver configuration sections.
    /// Key = driver name, Value = driver-specific TOML table.
    #[serde(default)]
    pub driver_config: HashMap<String, toml::Value>,
}

impl RigConfig {
    /// Load a configuration file and validate it.
    pub fn load_validated(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the rig configuration.
    ///
    /// # Validation Rules
    /// 1. Every shift angle is finite and > 0
    /// 2. Backlash is finite and >= 0
    /// 3. Shift power in (0, 100]
    /// 4. Drive power in [-100, 100] and non-zero
    /// 5. Speed interval finite and > 0
    /// 6. `min_samples` >= 2 (a median interval needs two timestamps)
    /// 7. Tone frequency > 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (pair, degrees) in self.gearbox.shift_degrees.iter().enumerate() {
            if !degrees.is_finite() || *degrees <= 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "shift_degrees[{}] (gears {}-{}) must be positive, got {}",
                    pair,
                    pair + 1,
                    pair + 2,
                    degrees
                )));
            }
        }

        let backlash = self.gearbox.backlash_degrees;
        if !backlash.is_finite() || backlash < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "backlash_degrees must be >= 0, got {backlash}"
            )));
        }

        let shift_power = self.gearbox.shift_power;
        if shift_power <= 0 || shift_power > 100 {
            return Err(ConfigError::ValidationError(format!(
                "shift_power must be in (0, 100], got {shift_power}"
            )));
        }

        let drive_power = self.drive.power;
        if drive_power == 0 || !(-100..=100).contains(&drive_power) {
            return Err(ConfigError::ValidationError(format!(
                "drive power must be in [-100, 100] and non-zero, got {drive_power}"
            )));
        }

        let interval = self.sampler.speed_interval_s;
        if !interval.is_finite() || interval <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "speed_interval_s must be positive, got {interval}"
            )));
        }

        if self.analyzer.min_samples < 2 {
            return Err(ConfigError::ValidationError(format!(
                "min_samples must be at least 2, got {}",
                self.analyzer.min_samples
            )));
        }

        if self.feedback.tone_hz == 0 {
            return Err(ConfigError::ValidationError(
                "tone_hz must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Driver-specific section, if present.
    pub fn driver_section(&self, driver: &str) -> Option<&toml::Value> {
        self.driver_config.get(driver)
    }
}

/// Trait for loading configuration from TOML files.
///
/// This trait provides a default implementation that works with any type
/// implementing `serde::de::DeserializeOwned`.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
