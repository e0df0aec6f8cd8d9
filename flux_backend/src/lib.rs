//! Motion-modulated wavetable synth core.
//!
//! Three contexts meet here: the device's render thread, the sensor ingest
//! thread and the control layer. They share only the [`ParameterChannel`]
//! and the published motion telemetry, all as independent atomics.
//!
//! [`ParameterChannel`]: rt_processing::parameters::ParameterChannel

pub mod audio_device;
pub mod engine;
pub mod motion;
pub mod rt_processing;
pub mod sensor;

pub use engine::FluxEngine;
