//! cpal implementation of the audio-hardware collaborator.
//!
//! Each stream lives on its own device thread because `cpal::Stream` is not
//! `Send` on every platform. Start/pause/close requests are forwarded to
//! that thread over a channel and never wait for the driver, so they are
//! safe to issue from the ingest thread.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::SampleFormat;
use crossbeam::atomic::AtomicCell;
use crossbeam::channel::{self, Receiver, Sender};
use dasp::sample::FromSample;
use flux_core::{DeviceError, StreamState};

use super::enumeration::default_output_device;
use super::negotiation::{ConfigNegotiator, NegotiatedConfig};
use super::{AudioHardware, RenderStream, StreamRequest};
use crate::rt_processing::callback::AudioCallback;

/// Scratch preallocated for integer output formats, in samples.
const CONVERSION_SCRATCH: usize = 8192;

/// How long `open_render_stream` waits for the device thread to report.
const OPEN_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamCommand {
    Start,
    Pause,
    Close,
}

/// Opens streams on the default output device of the default host.
#[derive(Debug, Clone, Default)]
pub struct CpalHardware;

impl CpalHardware {
    pub fn new() -> Self {
        Self
    }
}

impl AudioHardware for CpalHardware {
    fn open_render_stream(
        &self,
        request: StreamRequest,
        callback: Box<dyn AudioCallback>,
    ) -> Result<Arc<dyn RenderStream>, DeviceError> {
        let (command_tx, command_rx) = channel::unbounded();
        let (ready_tx, ready_rx) = channel::bounded(1);
        let state = Arc::new(AtomicCell::new(StreamState::Uninitialized));

        let thread_state = Arc::clone(&state);
        let thread = thread::Builder::new()
            .name("flux-audio-device".into())
            .spawn(move || device_thread(request, callback, thread_state, command_rx, ready_tx))
            .map_err(|e| DeviceError::Backend(format!("failed to spawn device thread: {e}")))?;

        match ready_rx.recv_timeout(OPEN_TIMEOUT) {
            Ok(Ok(config)) => {
                tracing::info!(%config, "render stream opened");
                Ok(Arc::new(CpalStream {
                    commands: command_tx,
                    state,
                    config,
                    thread: Some(thread),
                }))
            }
            Ok(Err(err)) => {
                let _ = thread.join();
                Err(err)
            }
            Err(_) => {
                // The device thread exits on its own once it sees the dropped sender.
                Err(DeviceError::StreamOpen("timed out waiting for device".into()))
            }
        }
    }
}

struct CpalStream {
    commands: Sender<StreamCommand>,
    state: Arc<AtomicCell<StreamState>>,
    config: NegotiatedConfig,
    thread: Option<JoinHandle<()>>,
}

impl CpalStream {
    fn send(&self, command: StreamCommand) -> Result<(), DeviceError> {
        self.commands.send(command).map_err(|_| DeviceError::Closed)
    }
}

impl RenderStream for CpalStream {
    fn request_start(&self) -> Result<(), DeviceError> {
        match self.state.load() {
            StreamState::Closed | StreamState::Disconnected => Err(DeviceError::Closed),
            StreamState::Started | StreamState::Starting => Ok(()),
            _ => {
                self.state.store(StreamState::Starting);
                self.send(StreamCommand::Start)
            }
        }
    }

    fn request_pause(&self) -> Result<(), DeviceError> {
        match self.state.load() {
            StreamState::Started | StreamState::Starting => {
                self.state.store(StreamState::Pausing);
                self.send(StreamCommand::Pause)
            }
            StreamState::Paused | StreamState::Pausing => Ok(()),
            other => Err(DeviceError::InvalidState(other)),
        }
    }

    fn close(&self) {
        self.state.store(StreamState::Stopping);
        if self.send(StreamCommand::Close).is_err() {
            self.state.store(StreamState::Closed);
        }
    }

    fn state(&self) -> StreamState {
        self.state.load()
    }

    fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    fn channels(&self) -> u16 {
        self.config.channels
    }
}

impl Drop for CpalStream {
    fn drop(&mut self) {
        let _ = self.commands.send(StreamCommand::Close);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("audio device thread panicked");
            }
        }
    }
}

fn device_thread(
    request: StreamRequest,
    callback: Box<dyn AudioCallback>,
    state: Arc<AtomicCell<StreamState>>,
    commands: Receiver<StreamCommand>,
    ready: Sender<Result<NegotiatedConfig, DeviceError>>,
) {
    let stream = match open_stream(request, callback, &state) {
        Ok((stream, config)) => {
            state.store(StreamState::Open);
            if ready.send(Ok(config)).is_err() {
                return;
            }
            stream
        }
        Err(err) => {
            let _ = ready.send(Err(err));
            return;
        }
    };

    // Ends on Close or when every sender is gone.
    for command in commands.iter() {
        match command {
            StreamCommand::Start => match stream.play() {
                Ok(()) => state.store(StreamState::Started),
                Err(err) => {
                    tracing::warn!(%err, "stream refused to start");
                    state.store(StreamState::Stopped);
                }
            },
            StreamCommand::Pause => match stream.pause() {
                Ok(()) => state.store(StreamState::Paused),
                Err(err) => {
                    tracing::warn!(%err, "stream refused to pause");
                    state.store(StreamState::Started);
                }
            },
            StreamCommand::Close => break,
        }
    }

    drop(stream);
    state.store(StreamState::Closed);
    tracing::debug!("render stream closed");
}

fn open_stream(
    request: StreamRequest,
    callback: Box<dyn AudioCallback>,
    state: &Arc<AtomicCell<StreamState>>,
) -> Result<(cpal::Stream, NegotiatedConfig), DeviceError> {
    let (device, caps) = default_output_device()?;
    let config = ConfigNegotiator::negotiate(&caps, &request)?;
    if !config.sample_rate_matched || !config.channels_matched {
        tracing::info!(requested = ?request, negotiated = %config, "device config differs from request");
    }

    let stream = match config.sample_format {
        SampleFormat::F32 => build_f32(&device, &config, callback, state),
        SampleFormat::I16 => build_converted::<i16>(&device, &config, callback, state),
        SampleFormat::U16 => build_converted::<u16>(&device, &config, callback, state),
        other => Err(DeviceError::StreamOpen(format!(
            "unsupported sample format {other:?}"
        ))),
    }?;
    Ok((stream, config))
}

fn error_handler(state: &Arc<AtomicCell<StreamState>>) -> impl FnMut(cpal::StreamError) + Send + 'static {
    let state = Arc::clone(state);
    move |err| {
        tracing::error!("Audio stream error: {}", err);
        if matches!(err, cpal::StreamError::DeviceNotAvailable) {
            state.store(StreamState::Disconnected);
        }
    }
}

fn build_f32(
    device: &cpal::Device,
    config: &NegotiatedConfig,
    mut callback: Box<dyn AudioCallback>,
    state: &Arc<AtomicCell<StreamState>>,
) -> Result<cpal::Stream, DeviceError> {
    let sample_rate = config.sample_rate as f32;
    let channels = config.channels as usize;
    device
        .build_output_stream(
            &config.stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let frames = data.len() / channels;
                callback.process(data, sample_rate, channels, frames);
            },
            error_handler(state),
            None,
        )
        .map_err(|e| DeviceError::StreamOpen(e.to_string()))
}

fn build_converted<T>(
    device: &cpal::Device,
    config: &NegotiatedConfig,
    mut callback: Box<dyn AudioCallback>,
    state: &Arc<AtomicCell<StreamState>>,
) -> Result<cpal::Stream, DeviceError>
where
    T: cpal::SizedSample + FromSample<f32>,
{
    let sample_rate = config.sample_rate as f32;
    let channels = config.channels as usize;
    let mut scratch = vec![0.0f32; CONVERSION_SCRATCH];
    device
        .build_output_stream(
            &config.stream_config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                render_converted(callback.as_mut(), &mut scratch, data, sample_rate, channels);
            },
            error_handler(state),
            None,
        )
        .map_err(|e| DeviceError::StreamOpen(e.to_string()))
}

/// Render into `data` through the f32 `scratch` buffer, in whole-frame
/// chunks no larger than `scratch`. Buffers larger than `scratch` cost one
/// `process` call per chunk.
fn render_converted<T>(
    callback: &mut dyn AudioCallback,
    scratch: &mut [f32],
    data: &mut [T],
    sample_rate: f32,
    channels: usize,
) where
    T: FromSample<f32>,
{
    let chunk_len = (scratch.len() / channels.max(1)) * channels.max(1);
    if chunk_len == 0 {
        return;
    }
    for chunk in data.chunks_mut(chunk_len) {
        let buf = &mut scratch[..chunk.len()];
        callback.process(buf, sample_rate, channels, chunk.len() / channels.max(1));
        for (out, &sample) in chunk.iter_mut().zip(buf.iter()) {
            *out = T::from_sample_(sample);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Writes a running sample index so chunk boundaries are visible.
    struct Counter {
        next: f32,
        calls: usize,
    }

    impl AudioCallback for Counter {
        fn process(&mut self, output: &mut [f32], _sample_rate: f32, channels: usize, frames: usize) {
            assert_eq!(output.len(), frames * channels);
            self.calls += 1;
            for sample in output.iter_mut() {
                *sample = self.next / 1000.0;
                self.next += 1.0;
            }
        }
    }

    #[test]
    fn test_oversized_buffer_renders_in_chunks() {
        let mut callback = Counter { next: 0.0, calls: 0 };
        let mut scratch = vec![0.0f32; 8];
        // 2 channels, 11 frames: chunks of 4, 4 and 3 frames.
        let mut data = vec![0i16; 22];

        render_converted(&mut callback, &mut scratch, &mut data, 48_000.0, 2);

        assert_eq!(callback.calls, 3);
        assert_eq!(scratch.len(), 8);
        for (i, &sample) in data.iter().enumerate() {
            assert_eq!(sample, i16::from_sample_(i as f32 / 1000.0), "sample {i}");
        }
    }

    #[test]
    fn test_chunks_hold_whole_frames() {
        let mut callback = Counter { next: 0.0, calls: 0 };
        // 7 scratch samples hold only two 3-channel frames.
        let mut scratch = vec![0.0f32; 7];
        let mut data = vec![0.0f32; 12];

        render_converted(&mut callback, &mut scratch, &mut data, 48_000.0, 3);

        assert_eq!(callback.calls, 2);
        assert_eq!(data[11], 0.011);
    }
}
