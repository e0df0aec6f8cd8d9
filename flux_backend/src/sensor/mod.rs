//! Motion-sensor collaborator interface.
//!
//! Device acquisition and event-queue mechanics live behind these traits;
//! the ingest loop only needs enable/disable and a bounded wait for the next
//! acceleration reading.

use std::time::Duration;

use flux_core::{Acceleration, SensorError};

pub mod channel;

pub use channel::{ChannelSensor, ChannelSensorProvider, MotionFeed};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    LinearAcceleration,
}

/// Source of sensor handles.
pub trait SensorProvider: Send + Sync {
    /// The platform default sensor of `kind`.
    ///
    /// Fails with [`SensorError::Unavailable`] when the device has none.
    fn default_sensor(&self, kind: SensorKind) -> Result<Box<dyn MotionSensor>, SensorError>;
}

/// A subscribed motion sensor. Used from the ingest thread only.
pub trait MotionSensor: Send {
    fn enable(&mut self, rate_hint_micros: u32) -> Result<(), SensorError>;

    fn disable(&mut self);

    /// Wait up to `timeout` for the next reading.
    ///
    /// `Ok(None)` means the wait elapsed. `Err(SensorError::Disconnected)`
    /// means no further readings will arrive.
    fn poll(&mut self, timeout: Duration) -> Result<Option<Acceleration>, SensorError>;
}
