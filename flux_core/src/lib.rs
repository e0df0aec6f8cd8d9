//! Shared types for the motion-driven synth: configuration, errors and the
//! plain values that cross the boundary between the backend and its hosts.

pub mod config;
pub mod error;
pub mod types;

pub use config::EngineConfig;
pub use error::{ConfigError, DeviceError, SensorError, TableError};
pub use types::{Acceleration, EventCounters, MotionSample, StreamState};
