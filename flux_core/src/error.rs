use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating an [`EngineConfig`](crate::EngineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error(transparent)]
    Table(#[from] TableError),
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Wavetable construction failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("wavetable size {0} is not a non-zero power of two")]
    SizeNotPowerOfTwo(usize),
}

/// Failures reported by the audio-hardware collaborator.
///
/// None of these escape the engine; they are logged and the engine keeps
/// running silently.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("no audio output device available")]
    Unavailable,

    #[error("failed to open render stream: {0}")]
    StreamOpen(String),

    #[error("stream refused request in state {0:?}")]
    InvalidState(crate::StreamState),

    #[error("stream is closed")]
    Closed,

    #[error("audio backend error: {0}")]
    Backend(String),
}

/// Failures reported by the motion-sensor collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SensorError {
    #[error("no linear acceleration sensor available")]
    Unavailable,

    #[error("sensor event source disconnected")]
    Disconnected,
}
