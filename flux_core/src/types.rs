use std::fmt;

/// One 3-axis linear acceleration reading in m/s².
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Acceleration {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Acceleration {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm of the vector.
    #[inline]
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Result of ingesting one raw sensor event.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionSample {
    /// Instantaneous magnitude of the raw event.
    pub magnitude: f32,
    /// Exponentially filtered magnitude after this event.
    pub smoothed_magnitude: f32,
}

/// Lifecycle state reported by an output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    #[default]
    Uninitialized,
    Open,
    Starting,
    Started,
    Pausing,
    Paused,
    Stopping,
    Stopped,
    Closed,
    Disconnected,
}

impl StreamState {
    /// States from which a start request brings the stream back.
    pub fn is_resumable(self) -> bool {
        matches!(self, Self::Paused | Self::Pausing | Self::Stopped)
    }
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Telemetry counters reset on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventCounters {
    pub render_callbacks: u64,
    pub sensor_events: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magnitude_is_euclidean_norm() {
        assert_eq!(Acceleration::new(3.0, 4.0, 0.0).magnitude(), 5.0);
        assert_eq!(Acceleration::default().magnitude(), 0.0);
        assert!((Acceleration::new(1.0, 2.0, 2.0).magnitude() - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_resumable_states() {
        assert!(StreamState::Paused.is_resumable());
        assert!(StreamState::Pausing.is_resumable());
        assert!(StreamState::Stopped.is_resumable());
        assert!(!StreamState::Started.is_resumable());
        assert!(!StreamState::Closed.is_resumable());
    }
}
