//! Engine object exposed to the control layer.
//!
//! Owns the wavetable, parameter channel and telemetry for its whole
//! lifetime, and the output stream and ingest thread between `start` and
//! `stop`. Device failures never reach the caller: the engine logs them and
//! keeps running without sound or without motion input.

use std::sync::Arc;

use flux_core::{ConfigError, EngineConfig, EventCounters, StreamState};

use crate::audio_device::{AudioHardware, PowerControl, RenderStream, StreamPower, StreamRequest};
use crate::motion::{IngestHandle, MotionTelemetry, SensorIngest};
use crate::rt_processing::callback::SynthCallback;
use crate::rt_processing::parameters::ParameterChannel;
use crate::rt_processing::performance::{RenderSnapshot, RenderTelemetry};
use crate::rt_processing::waveform::{Wavetable, WavetableOscillator};
use crate::sensor::{SensorKind, SensorProvider};

pub struct FluxEngine {
    config: EngineConfig,
    table: Arc<Wavetable>,
    params: Arc<ParameterChannel>,
    render_telemetry: Arc<RenderTelemetry>,
    motion_telemetry: Arc<MotionTelemetry>,
    hardware: Arc<dyn AudioHardware>,
    sensors: Arc<dyn SensorProvider>,
    stream: Option<Arc<dyn RenderStream>>,
    ingest: Option<IngestHandle>,
    running: bool,
}

impl FluxEngine {
    pub fn new(
        config: EngineConfig,
        hardware: Arc<dyn AudioHardware>,
        sensors: Arc<dyn SensorProvider>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let table = Arc::new(Wavetable::sine(config.synth.table_size)?);
        let params = Arc::new(ParameterChannel::from_config(&config.synth));
        Ok(Self {
            config,
            table,
            params,
            render_telemetry: Arc::new(RenderTelemetry::new()),
            motion_telemetry: Arc::new(MotionTelemetry::new()),
            hardware,
            sensors,
            stream: None,
            ingest: None,
            running: false,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Open and start the output stream, then start motion ingest.
    /// Either half may be missing afterwards if its device is unavailable.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;

        self.stream = self.open_stream();
        self.motion_telemetry.publish(0.0);
        self.motion_telemetry.set_sensor_paused(false);
        self.ingest = self.start_ingest();

        tracing::info!(
            audio = self.stream.is_some(),
            motion = self.ingest.is_some(),
            "engine started"
        );
    }

    fn open_stream(&self) -> Option<Arc<dyn RenderStream>> {
        let synth = &self.config.synth;
        let oscillator = WavetableOscillator::new(Arc::clone(&self.table), synth.initial_frequency)
            .with_silence_epsilon(synth.silence_epsilon);
        let callback = SynthCallback::new(
            oscillator,
            Arc::clone(&self.params),
            Arc::clone(&self.render_telemetry),
        );

        let stream = match self
            .hardware
            .open_render_stream(StreamRequest::mono(synth.sample_rate), Box::new(callback))
        {
            Ok(stream) => stream,
            Err(err) => {
                tracing::warn!(%err, "audio output unavailable; running silent");
                return None;
            }
        };
        tracing::debug!(
            sample_rate = stream.sample_rate(),
            channels = stream.channels(),
            "render stream open"
        );
        if let Err(err) = stream.request_start() {
            tracing::warn!(%err, "render stream refused to start");
        }
        Some(stream)
    }

    fn start_ingest(&self) -> Option<IngestHandle> {
        let sensor = match self.sensors.default_sensor(SensorKind::LinearAcceleration) {
            Ok(sensor) => sensor,
            Err(err) => {
                tracing::warn!(%err, "running without motion input");
                return None;
            }
        };
        let power = self
            .stream
            .as_ref()
            .map(|stream| Arc::new(StreamPower::new(Arc::clone(stream))) as Arc<dyn PowerControl>);
        let ingest = SensorIngest::new(
            sensor,
            &self.config,
            Arc::clone(&self.params),
            Arc::clone(&self.motion_telemetry),
            power,
        );
        match ingest.spawn() {
            Ok(handle) => Some(handle),
            Err(err) => {
                tracing::warn!(%err, "failed to spawn sensor ingest thread");
                None
            }
        }
    }

    /// Join the ingest thread, then close the stream.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;

        if let Some(ingest) = self.ingest.take() {
            ingest.stop();
        }
        if let Some(stream) = self.stream.take() {
            stream.close();
        }
        self.motion_telemetry.publish(0.0);
        tracing::info!("engine stopped");
    }

    /// Write pitch and level directly, bypassing the motion mapper.
    pub fn set_target_parameters(&self, frequency: f32, amplitude: f32) {
        self.params.set_targets(frequency, amplitude);
    }

    pub fn set_master_volume(&self, volume: f32) {
        self.params.set_master_volume(volume);
    }

    /// Ignored while no sensor is running.
    pub fn set_sensor_paused(&self, paused: bool) {
        if self.ingest.is_some() {
            self.motion_telemetry.set_sensor_paused(paused);
        }
    }

    pub fn current_magnitude(&self) -> f32 {
        if self.ingest.is_some() {
            self.motion_telemetry.current_magnitude()
        } else {
            0.0
        }
    }

    pub fn get_and_reset_event_counters(&self) -> EventCounters {
        EventCounters {
            render_callbacks: self.render_telemetry.take_callback_count(),
            sensor_events: self.motion_telemetry.take_event_count(),
        }
    }

    pub fn stream_state(&self) -> Option<StreamState> {
        self.stream.as_ref().map(|stream| stream.state())
    }

    /// Negotiated `(sample_rate, channels)` of the open stream.
    pub fn output_format(&self) -> Option<(u32, u16)> {
        self.stream
            .as_ref()
            .map(|stream| (stream.sample_rate(), stream.channels()))
    }

    pub fn render_snapshot(&self) -> RenderSnapshot {
        self.render_telemetry.snapshot()
    }

    pub fn parameters(&self) -> &ParameterChannel {
        &self.params
    }
}

impl Drop for FluxEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
