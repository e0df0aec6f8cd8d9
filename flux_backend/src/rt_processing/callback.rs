//! Realtime render callback.
//!
//! The audio-hardware collaborator owns the thread that calls
//! [`AudioCallback::process`]. Nothing reachable from `process` may block,
//! allocate, lock or log.

use std::sync::Arc;

use super::parameters::ParameterChannel;
use super::performance::RenderTelemetry;
use super::waveform::WavetableOscillator;

/// Trait every realtime processor must implement.
pub trait AudioCallback: Send + 'static {
    /// Fill the interleaved `output` buffer (length == frames * channels) with audio.
    ///
    /// - `output`: interleaved f32 buffer to fill (already sized by caller).
    /// - `sample_rate`: sample rate in Hz.
    /// - `channels`: number of channels.
    /// - `frames`: number of frames in this buffer.
    fn process(&mut self, output: &mut [f32], sample_rate: f32, channels: usize, frames: usize);
}

/// Drives the oscillator from the shared parameter channel.
pub struct SynthCallback {
    oscillator: WavetableOscillator,
    params: Arc<ParameterChannel>,
    telemetry: Arc<RenderTelemetry>,
}

impl SynthCallback {
    pub fn new(
        oscillator: WavetableOscillator,
        params: Arc<ParameterChannel>,
        telemetry: Arc<RenderTelemetry>,
    ) -> Self {
        Self {
            oscillator,
            params,
            telemetry,
        }
    }

    pub fn oscillator(&self) -> &WavetableOscillator {
        &self.oscillator
    }
}

impl AudioCallback for SynthCallback {
    fn process(&mut self, output: &mut [f32], sample_rate: f32, channels: usize, frames: usize) {
        let _guard = self.telemetry.scoped_callback();

        // Guard: never trust `frames` beyond what the buffer holds.
        let frames = match output.len().checked_div(channels) {
            Some(available) => frames.min(available),
            None => 0,
        };
        if frames == 0 {
            return;
        }

        let snapshot = self.params.snapshot();
        self.oscillator.render(&mut output[..frames], snapshot, sample_rate);
        fan_out_in_place(output, frames, channels);
        output[frames * channels..].fill(0.0);

        self.telemetry.add_frames(frames as u64);
    }
}

/// Spread a mono block stored in `buf[..frames]` across `channels`
/// interleaved channels. Walks backwards so no sample is overwritten
/// before it is read.
#[inline]
fn fan_out_in_place(buf: &mut [f32], frames: usize, channels: usize) {
    if channels <= 1 {
        return;
    }
    for frame in (0..frames).rev() {
        let sample = buf[frame];
        let start = frame * channels;
        buf[start..start + channels].fill(sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rt_processing::waveform::Wavetable;

    fn callback(params: Arc<ParameterChannel>, telemetry: Arc<RenderTelemetry>) -> SynthCallback {
        let table = Arc::new(Wavetable::from_fn(16, |_| 1.0).unwrap());
        SynthCallback::new(WavetableOscillator::new(table, 440.0), params, telemetry)
    }

    #[test]
    fn test_fan_out_duplicates_mono() {
        let mut buf = [1.0, 2.0, 3.0, 0.0, 0.0, 0.0];
        fan_out_in_place(&mut buf, 3, 2);
        assert_eq!(buf, [1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);

        let mut buf = [5.0, 6.0, 0.0, 0.0, 0.0, 0.0];
        fan_out_in_place(&mut buf, 2, 3);
        assert_eq!(buf, [5.0, 5.0, 5.0, 6.0, 6.0, 6.0]);
    }

    #[test]
    fn test_process_counts_callbacks_and_frames() {
        let params = Arc::new(ParameterChannel::default());
        let telemetry = Arc::new(RenderTelemetry::new());
        let mut cb = callback(Arc::clone(&params), Arc::clone(&telemetry));

        let mut out = [0.0f32; 64];
        cb.process(&mut out, 48_000.0, 1, 64);
        cb.process(&mut out, 48_000.0, 1, 64);

        assert_eq!(telemetry.take_callback_count(), 2);
        assert_eq!(telemetry.snapshot().frames_rendered, 128);
        // Amplitude defaults to zero.
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_stereo_output_is_identical_per_frame() {
        let params = Arc::new(ParameterChannel::default());
        params.set_targets(440.0, 1.0);
        let mut cb = callback(Arc::clone(&params), Arc::new(RenderTelemetry::new()));

        let mut out = [0.0f32; 32];
        cb.process(&mut out, 48_000.0, 2, 16);
        for frame in out.chunks_exact(2) {
            assert_eq!(frame[0], frame[1]);
        }
        assert!((out[30] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_zero_channels_or_frames_is_noop() {
        let params = Arc::new(ParameterChannel::default());
        params.set_targets(440.0, 1.0);
        let mut cb = callback(params, Arc::new(RenderTelemetry::new()));

        let mut out = [7.0f32; 8];
        cb.process(&mut out, 48_000.0, 0, 8);
        cb.process(&mut out, 48_000.0, 1, 0);
        assert!(out.iter().all(|&s| s == 7.0));
        assert_eq!(cb.oscillator().state().current_amplitude, 0.0);
    }
}
