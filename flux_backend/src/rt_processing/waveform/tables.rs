use std::f64::consts::PI;

use flux_core::TableError;

/// Default single-cycle table length. Power of 2 for fast masking.
pub const DEFAULT_TABLE_SIZE: usize = 4096;

/// Immutable single-cycle waveform lookup table.
///
/// The length is always a power of two so the read index wraps with a mask
/// instead of a modulo.
#[derive(Debug, Clone)]
pub struct Wavetable {
    samples: Box<[f32]>,
    mask: usize,
}

impl Wavetable {
    /// Build a sine table of `size` samples.
    pub fn sine(size: usize) -> Result<Self, TableError> {
        Self::from_fn(size, |phase| (2.0 * PI * phase).sin() as f32)
    }

    /// Build a table by sampling `f` at normalized phases `i / size`.
    pub fn from_fn(size: usize, f: impl Fn(f64) -> f32) -> Result<Self, TableError> {
        if size == 0 || !size.is_power_of_two() {
            return Err(TableError::SizeNotPowerOfTwo(size));
        }
        let samples = (0..size)
            .map(|i| f(i as f64 / size as f64))
            .collect::<Vec<f32>>()
            .into_boxed_slice();
        Ok(Self {
            samples,
            mask: size - 1,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Table length as a float, for phase arithmetic.
    #[inline]
    pub fn size_f64(&self) -> f64 {
        self.samples.len() as f64
    }

    /// Non-interpolated lookup. `phase` is in table units, `[0, len)`.
    #[inline]
    pub fn lookup(&self, phase: f64) -> f32 {
        self.samples[phase as usize & self.mask]
    }

    /// Phase advance per sample, in table units, for `frequency` at `sample_rate`.
    #[inline]
    pub fn phase_scalar(&self, sample_rate: f64) -> f64 {
        self.size_f64() / sample_rate
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_initialization() {
        let table = Wavetable::sine(DEFAULT_TABLE_SIZE).unwrap();
        assert_eq!(table.len(), DEFAULT_TABLE_SIZE);
        assert!(table.as_slice().iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn test_rejects_non_power_of_two() {
        assert_eq!(
            Wavetable::sine(1000).unwrap_err(),
            TableError::SizeNotPowerOfTwo(1000)
        );
        assert!(Wavetable::sine(0).is_err());
    }

    #[test]
    fn test_sine_wave_properties() {
        let table = Wavetable::sine(DEFAULT_TABLE_SIZE).unwrap();
        let quarter = DEFAULT_TABLE_SIZE as f64 / 4.0;
        assert!(table.lookup(0.0).abs() < 0.001);
        assert!((table.lookup(quarter) - 1.0).abs() < 0.001);
        assert!(table.lookup(2.0 * quarter).abs() < 0.001);
        assert!((table.lookup(3.0 * quarter) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_lookup_truncates_and_wraps() {
        let table = Wavetable::from_fn(8, |phase| (phase * 8.0) as f32).unwrap();
        assert_eq!(table.lookup(2.9), 2.0);
        // Index past the end wraps through the mask.
        assert_eq!(table.lookup(9.5), 1.0);
    }
}
