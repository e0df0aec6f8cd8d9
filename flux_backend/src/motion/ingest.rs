//! Sensor ingest loop.
//!
//! Runs on its own thread: waits (bounded) for raw acceleration, smooths the
//! magnitude, publishes it, advances the stillness tracker and retargets the
//! oscillator pitch. The bounded wait is what lets a stop request land
//! promptly.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::atomic::AtomicCell;
use flux_core::{Acceleration, EngineConfig, MotionSample};

use super::mapper::MotionMapper;
use super::stillness::StillnessTracker;
use crate::audio_device::PowerControl;
use crate::rt_processing::parameters::ParameterChannel;
use crate::sensor::MotionSensor;

/// Values the ingest thread shares with the control layer.
#[derive(Default)]
pub struct MotionTelemetry {
    smoothed_magnitude: AtomicCell<f32>,
    sensor_events: AtomicU64,
    sensor_paused: AtomicBool,
}

impl MotionTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last published smoothed magnitude.
    pub fn current_magnitude(&self) -> f32 {
        self.smoothed_magnitude.load()
    }

    pub fn publish(&self, smoothed: f32) {
        self.smoothed_magnitude.store(smoothed);
    }

    pub fn count_event(&self) {
        self.sensor_events.fetch_add(1, Ordering::Relaxed);
    }

    /// Events since the previous call, resetting the counter to zero.
    pub fn take_event_count(&self) -> u64 {
        self.sensor_events.swap(0, Ordering::AcqRel)
    }

    pub fn set_sensor_paused(&self, paused: bool) {
        self.sensor_paused.store(paused, Ordering::Release);
    }

    pub fn is_sensor_paused(&self) -> bool {
        self.sensor_paused.load(Ordering::Acquire)
    }
}

pub struct SensorIngest {
    sensor: Box<dyn MotionSensor>,
    params: Arc<ParameterChannel>,
    telemetry: Arc<MotionTelemetry>,
    power: Option<Arc<dyn PowerControl>>,
    mapper: MotionMapper,
    tracker: StillnessTracker,
    smoothing_retain: f32,
    smoothed: f32,
    rate_hint_micros: u32,
    poll_timeout: Duration,
}

impl SensorIngest {
    /// `power` is `None` when no output stream could be opened; the tracker
    /// still runs but has nothing to suspend.
    pub fn new(
        sensor: Box<dyn MotionSensor>,
        config: &EngineConfig,
        params: Arc<ParameterChannel>,
        telemetry: Arc<MotionTelemetry>,
        power: Option<Arc<dyn PowerControl>>,
    ) -> Self {
        Self {
            sensor,
            params,
            telemetry,
            power,
            mapper: MotionMapper::from_config(&config.mapping),
            tracker: StillnessTracker::from_config(&config.stillness),
            smoothing_retain: config.sensor.smoothing_retain,
            smoothed: 0.0,
            rate_hint_micros: config.sensor.rate_hint_micros,
            poll_timeout: config.sensor.poll_timeout(),
        }
    }

    pub fn tracker(&self) -> &StillnessTracker {
        &self.tracker
    }

    pub fn smoothed(&self) -> f32 {
        self.smoothed
    }

    /// Handle one raw reading.
    pub fn process(&mut self, reading: Acceleration) -> MotionSample {
        self.telemetry.count_event();

        let magnitude = reading.magnitude();
        self.smoothed =
            self.smoothed * self.smoothing_retain + magnitude * (1.0 - self.smoothing_retain);
        let smoothed = self.smoothed;
        self.telemetry.publish(smoothed);

        match &self.power {
            Some(power) => self.tracker.update_with(smoothed, power.as_ref()),
            None => self.tracker.update(smoothed),
        };

        // Keep retargeting while suspended so pitch is already right on wake.
        self.mapper.apply(smoothed, &self.params);

        MotionSample {
            magnitude,
            smoothed_magnitude: smoothed,
        }
    }

    fn enable(&mut self) -> bool {
        match self.sensor.enable(self.rate_hint_micros) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(%err, "failed to enable motion sensor");
                false
            }
        }
    }

    /// Loop until `stop` is set or the sensor disconnects, then disable the
    /// sensor. Pause changes and `stop` take effect within one poll timeout.
    pub fn run(mut self, stop: &AtomicBool) {
        let mut paused = self.telemetry.is_sensor_paused();
        let enabled = !paused && self.enable();
        tracing::info!(
            rate_hint_micros = self.rate_hint_micros,
            enabled,
            "sensor ingest started"
        );

        while !stop.load(Ordering::Acquire) {
            let want_paused = self.telemetry.is_sensor_paused();
            if want_paused != paused {
                paused = want_paused;
                if paused {
                    self.sensor.disable();
                    tracing::debug!("motion sensor paused");
                } else {
                    let enabled = self.enable();
                    tracing::debug!(enabled, "motion sensor unpaused");
                }
            }

            // Still polled while paused so the wait stays bounded.
            match self.sensor.poll(self.poll_timeout) {
                Ok(Some(reading)) if !paused => {
                    self.process(reading);
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(%err, "motion sensor lost; continuing without motion input");
                    break;
                }
            }
        }

        self.sensor.disable();
        tracing::info!("sensor ingest stopped");
    }

    pub fn spawn(self) -> io::Result<IngestHandle> {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let thread = thread::Builder::new()
            .name("flux-sensor-ingest".into())
            .spawn(move || self.run(&thread_stop))?;
        Ok(IngestHandle {
            stop,
            thread: Some(thread),
        })
    }
}

/// Owns the ingest thread. Dropping it stops and joins the thread.
pub struct IngestHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl IngestHandle {
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(|t| t.is_finished())
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("sensor ingest thread panicked");
            }
        }
    }
}

impl Drop for IngestHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
