//! Lock-free parameter channel between producers and the render callback.
//!
//! Each field is its own atomic cell. Readers may observe a new frequency
//! alongside a stale amplitude; the renderer ramps toward whatever it sees
//! at block start and converges within one block.

use crossbeam::atomic::AtomicCell;
use flux_core::config::SynthConfig;

/// Values the renderer reads once at the start of every block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSnapshot {
    pub target_frequency: f32,
    pub target_amplitude: f32,
    pub master_gain: f32,
}

pub struct ParameterChannel {
    target_frequency: AtomicCell<f32>,
    target_amplitude: AtomicCell<f32>,
    master_gain: AtomicCell<f32>,
}

impl ParameterChannel {
    /// Applied to every volume write. Caps loudness whatever the caller passes.
    pub const GAIN_SAFETY: f32 = 0.4;

    pub fn new(target_frequency: f32, master_gain: f32) -> Self {
        Self {
            target_frequency: AtomicCell::new(target_frequency),
            target_amplitude: AtomicCell::new(0.0),
            master_gain: AtomicCell::new(master_gain),
        }
    }

    pub fn from_config(config: &SynthConfig) -> Self {
        Self::new(config.initial_frequency, config.initial_master_gain)
    }

    // Wait-free accessors. Last write wins; nothing is clamped here.

    #[inline]
    pub fn target_frequency(&self) -> f32 {
        self.target_frequency.load()
    }

    #[inline]
    pub fn set_target_frequency(&self, hz: f32) {
        self.target_frequency.store(hz);
    }

    #[inline]
    pub fn target_amplitude(&self) -> f32 {
        self.target_amplitude.load()
    }

    #[inline]
    pub fn set_target_amplitude(&self, amplitude: f32) {
        self.target_amplitude.store(amplitude);
    }

    #[inline]
    pub fn master_gain(&self) -> f32 {
        self.master_gain.load()
    }

    /// Store `volume` scaled by the safety factor.
    #[inline]
    pub fn set_master_volume(&self, volume: f32) {
        self.master_gain.store(volume * Self::GAIN_SAFETY);
    }

    /// Write frequency and amplitude as two independent stores.
    pub fn set_targets(&self, frequency: f32, amplitude: f32) {
        self.set_target_frequency(frequency);
        self.set_target_amplitude(amplitude);
    }

    /// Three independent loads. Not a transaction.
    #[inline]
    pub fn snapshot(&self) -> ParameterSnapshot {
        ParameterSnapshot {
            target_frequency: self.target_frequency.load(),
            target_amplitude: self.target_amplitude.load(),
            master_gain: self.master_gain.load(),
        }
    }
}

impl Default for ParameterChannel {
    fn default() -> Self {
        Self::from_config(&SynthConfig::default())
    }
}
