use cpal::{BufferSize, SampleFormat, SampleRate, StreamConfig};
use std::fmt;
use thiserror::Error;

use flux_core::DeviceError;

use super::StreamRequest;
use super::enumeration::OutputCapabilities;

/// Formats the render path can write, in order of preference.
const PREFERRED_FORMATS: [SampleFormat; 3] = [SampleFormat::F32, SampleFormat::I16, SampleFormat::U16];

#[derive(Debug, Clone, PartialEq)]
pub struct NegotiatedConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub sample_format: SampleFormat,
    pub stream_config: StreamConfig,

    pub sample_rate_matched: bool,
    pub channels_matched: bool,
}

impl fmt::Display for NegotiatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}ch @ {}Hz, format: {:?}",
            self.channels, self.sample_rate, self.sample_format
        )
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NegotiationError {
    #[error("no supported sample format among {available:?}")]
    FormatNotSupported { available: Vec<SampleFormat> },

    #[error("device reports no output channels")]
    NoChannels,
}

impl From<NegotiationError> for DeviceError {
    fn from(err: NegotiationError) -> Self {
        DeviceError::StreamOpen(err.to_string())
    }
}

pub type NegotiationResult<T> = Result<T, NegotiationError>;

pub struct ConfigNegotiator;

impl ConfigNegotiator {
    /// Pick the closest stream config the device supports. Rate and channel
    /// mismatches fall back to device defaults; only an unusable sample
    /// format or a channel-less device fails.
    pub fn negotiate(
        caps: &OutputCapabilities,
        request: &StreamRequest,
    ) -> NegotiationResult<NegotiatedConfig> {
        let sample_rate = Self::negotiate_sample_rate(caps, request.sample_rate);
        let channels = Self::negotiate_channels(caps, request.channels)?;
        let sample_format = Self::negotiate_sample_format(caps)?;

        let stream_config = StreamConfig {
            channels,
            sample_rate: SampleRate(sample_rate),
            buffer_size: BufferSize::Default,
        };

        Ok(NegotiatedConfig {
            sample_rate,
            channels,
            sample_format,
            stream_config,
            sample_rate_matched: sample_rate == request.sample_rate,
            channels_matched: channels == request.channels,
        })
    }

    fn negotiate_sample_rate(caps: &OutputCapabilities, requested: u32) -> u32 {
        if caps.supports_sample_rate(requested) {
            return requested;
        }
        for &rate in &[48_000, 44_100] {
            if caps.supports_sample_rate(rate) {
                return rate;
            }
        }
        caps.default_sample_rate
    }

    fn negotiate_channels(caps: &OutputCapabilities, requested: u16) -> NegotiationResult<u16> {
        if caps.supported_channels.contains(&requested) {
            return Ok(requested);
        }
        // Fewest channels wastes the least fan-out work.
        caps.supported_channels
            .iter()
            .copied()
            .filter(|&c| c > 0)
            .min()
            .or((caps.default_channels > 0).then_some(caps.default_channels))
            .ok_or(NegotiationError::NoChannels)
    }

    fn negotiate_sample_format(caps: &OutputCapabilities) -> NegotiationResult<SampleFormat> {
        PREFERRED_FORMATS
            .iter()
            .copied()
            .find(|f| caps.supported_sample_formats.contains(f))
            .ok_or_else(|| NegotiationError::FormatNotSupported {
                available: caps.supported_sample_formats.clone(),
            })
    }
}
