pub mod callback;
pub mod parameters;
pub mod performance;
pub mod waveform;
