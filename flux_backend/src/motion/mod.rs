//! Motion ingest: smoothing, pitch mapping and stillness detection.

pub mod ingest;
pub mod mapper;
pub mod stillness;

pub use ingest::{IngestHandle, MotionTelemetry, SensorIngest};
pub use mapper::MotionMapper;
pub use stillness::{PowerRequest, StillnessPhase, StillnessState, StillnessTracker};
