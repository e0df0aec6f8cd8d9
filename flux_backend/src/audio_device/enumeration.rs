use cpal::traits::{DeviceTrait, HostTrait};
use std::fmt;

use flux_core::DeviceError;

/// What an output device reports it can do.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputCapabilities {
    pub name: String,

    pub min_sample_rate: u32,
    pub max_sample_rate: u32,
    pub default_sample_rate: u32,

    pub supported_channels: Vec<u16>,
    pub default_channels: u16,

    pub supported_sample_formats: Vec<cpal::SampleFormat>,
    pub default_sample_format: cpal::SampleFormat,
}

impl fmt::Display for OutputCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}ch @ {}Hz, {}-{}Hz]",
            self.name,
            self.default_channels,
            self.default_sample_rate,
            self.min_sample_rate,
            self.max_sample_rate
        )
    }
}

impl OutputCapabilities {
    pub fn query(device: &cpal::Device) -> Result<Self, DeviceError> {
        let name = device
            .name()
            .unwrap_or_else(|_| "Unknown Device".to_string());

        let default_config = device
            .default_output_config()
            .map_err(|e| DeviceError::Backend(format!("failed to get default config: {e}")))?;

        let mut min_sample_rate = u32::MAX;
        let mut max_sample_rate = 0u32;
        let mut supported_channels = Vec::new();
        let mut supported_sample_formats = Vec::new();

        let configs = device
            .supported_output_configs()
            .map_err(|e| DeviceError::Backend(format!("failed to get supported configs: {e}")))?;
        for range in configs {
            min_sample_rate = min_sample_rate.min(range.min_sample_rate().0);
            max_sample_rate = max_sample_rate.max(range.max_sample_rate().0);

            if !supported_channels.contains(&range.channels()) {
                supported_channels.push(range.channels());
            }
            if !supported_sample_formats.contains(&range.sample_format()) {
                supported_sample_formats.push(range.sample_format());
            }
        }
        supported_channels.sort_unstable();

        let default_sample_rate = default_config.sample_rate().0;
        if min_sample_rate > max_sample_rate {
            // No ranges reported; trust the default config alone.
            min_sample_rate = default_sample_rate;
            max_sample_rate = default_sample_rate;
        }

        Ok(Self {
            name,
            min_sample_rate,
            max_sample_rate,
            default_sample_rate,
            supported_channels,
            default_channels: default_config.channels(),
            supported_sample_formats,
            default_sample_format: default_config.sample_format(),
        })
    }

    pub fn supports_sample_rate(&self, rate: u32) -> bool {
        rate >= self.min_sample_rate && rate <= self.max_sample_rate
    }
}

/// The default output device of the default host.
pub fn default_output_device() -> Result<(cpal::Device, OutputCapabilities), DeviceError> {
    let host = cpal::default_host();
    let device = host.default_output_device().ok_or(DeviceError::Unavailable)?;
    let caps = OutputCapabilities::query(&device)?;
    tracing::debug!(host = ?host.id(), device = %caps, "found default output device");
    Ok((device, caps))
}
