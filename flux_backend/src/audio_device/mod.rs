//! Audio-hardware collaborator interface and its cpal implementation.

use std::sync::Arc;

use flux_core::{DeviceError, StreamState};

use crate::rt_processing::callback::AudioCallback;

pub mod cpal_backend;
pub mod enumeration;
pub mod negotiation;
pub mod power;

pub use cpal_backend::CpalHardware;
pub use power::{PowerControl, StreamPower};

/// What the engine asks of an output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamRequest {
    pub sample_rate: u32,
    pub channels: u16,
}

impl StreamRequest {
    pub fn mono(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: 1,
        }
    }
}

/// Opens render streams. Implementations own device acquisition.
pub trait AudioHardware: Send + Sync {
    /// Open a stream that calls `callback` on the device's render thread.
    /// The stream is returned in a non-started state.
    fn open_render_stream(
        &self,
        request: StreamRequest,
        callback: Box<dyn AudioCallback>,
    ) -> Result<Arc<dyn RenderStream>, DeviceError>;
}

/// Handle to an open output stream.
///
/// Requests may complete asynchronously; `state` reports where the stream
/// currently is.
pub trait RenderStream: Send + Sync {
    fn request_start(&self) -> Result<(), DeviceError>;

    fn request_pause(&self) -> Result<(), DeviceError>;

    /// Release the device. Further requests fail with [`DeviceError::Closed`].
    fn close(&self);

    fn state(&self) -> StreamState;

    /// Negotiated rate, which may differ from the requested one.
    fn sample_rate(&self) -> u32;

    fn channels(&self) -> u16;
}
