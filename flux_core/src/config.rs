//! Engine configuration.
//!
//! Every section falls back to its defaults when omitted, so an empty JSON
//! object is a valid config.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub synth: SynthConfig,
    pub mapping: MappingConfig,
    pub stillness: StillnessConfig,
    pub sensor: SensorConfig,
}

/// Renderer and parameter channel settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SynthConfig {
    /// Requested output rate. The device may negotiate a different one.
    pub sample_rate: u32,
    pub table_size: usize,
    pub initial_frequency: f32,
    pub initial_master_gain: f32,
    /// Amplitude at or below which a block is rendered as silence.
    pub silence_epsilon: f32,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            table_size: 4096,
            initial_frequency: 440.0,
            initial_master_gain: 0.3,
            silence_epsilon: 0.001,
        }
    }
}

/// Affine motion-to-pitch map: `base_frequency + magnitude * frequency_span`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MappingConfig {
    pub base_frequency: f32,
    pub frequency_span: f32,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            base_frequency: 100.0,
            frequency_span: 200.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StillnessConfig {
    /// Smoothed magnitudes below this count as still.
    pub cutoff: f32,
    /// Consecutive still samples before the stream is suspended.
    pub threshold: u32,
}

impl Default for StillnessConfig {
    fn default() -> Self {
        Self {
            cutoff: 0.1,
            threshold: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SensorConfig {
    pub rate_hint_micros: u32,
    pub poll_timeout_ms: u64,
    /// Weight kept from the previous smoothed value; the raw reading gets `1 - retain`.
    pub smoothing_retain: f32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            rate_hint_micros: 40_000,
            poll_timeout_ms: 200,
            smoothing_retain: 0.8,
        }
    }
}

impl SensorConfig {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample_rate(mut self, rate: u32) -> Self {
        self.synth.sample_rate = rate;
        self
    }

    pub fn with_table_size(mut self, size: usize) -> Self {
        self.synth.table_size = size;
        self
    }

    pub fn with_stillness(mut self, cutoff: f32, threshold: u32) -> Self {
        self.stillness = StillnessConfig { cutoff, threshold };
        self
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.sensor.poll_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let size = self.synth.table_size;
        if size == 0 || !size.is_power_of_two() {
            return Err(crate::TableError::SizeNotPowerOfTwo(size).into());
        }
        if self.synth.sample_rate == 0 {
            return Err(ConfigError::invalid("synth.sample_rate", "must be non-zero"));
        }
        if self.stillness.threshold == 0 {
            return Err(ConfigError::invalid("stillness.threshold", "must be at least 1"));
        }
        let retain = self.sensor.smoothing_retain;
        if !(0.0..1.0).contains(&retain) {
            return Err(ConfigError::invalid(
                "sensor.smoothing_retain",
                format!("{retain} is outside [0, 1)"),
            ));
        }
        if self.sensor.poll_timeout_ms == 0 {
            return Err(ConfigError::invalid("sensor.poll_timeout_ms", "must be positive"));
        }
        Ok(())
    }
}
