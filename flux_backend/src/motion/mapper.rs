use flux_core::config::MappingConfig;

use crate::rt_processing::parameters::ParameterChannel;

/// Affine map from smoothed motion magnitude to pitch.
///
/// No upper clamp: callers wanting a bounded range clamp the magnitude first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionMapper {
    base_frequency: f32,
    frequency_span: f32,
}

impl MotionMapper {
    pub fn new(base_frequency: f32, frequency_span: f32) -> Self {
        Self {
            base_frequency,
            frequency_span,
        }
    }

    pub fn from_config(config: &MappingConfig) -> Self {
        Self::new(config.base_frequency, config.frequency_span)
    }

    #[inline]
    pub fn frequency_for(&self, magnitude: f32) -> f32 {
        self.base_frequency + magnitude * self.frequency_span
    }

    /// Write the mapped frequency as the new target. Amplitude and master
    /// gain are left alone.
    #[inline]
    pub fn apply(&self, magnitude: f32, params: &ParameterChannel) -> f32 {
        let frequency = self.frequency_for(magnitude);
        params.set_target_frequency(frequency);
        frequency
    }
}

impl Default for MotionMapper {
    fn default() -> Self {
        Self::from_config(&MappingConfig::default())
    }
}
