pub mod tables;
pub mod oscillators;

pub use oscillators::{OscillatorState, WavetableOscillator};
pub use tables::{DEFAULT_TABLE_SIZE, Wavetable};
