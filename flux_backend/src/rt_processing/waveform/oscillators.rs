use std::sync::Arc;

use super::tables::Wavetable;
use crate::rt_processing::parameters::ParameterSnapshot;

/// Default amplitude at or below which a block is treated as silent.
pub const SILENCE_EPSILON: f32 = 0.001;

/// Renderer state. Owned by the render thread only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OscillatorState {
    /// Read position in table units, always in `[0, table_size)`.
    pub phase: f64,
    pub current_frequency: f32,
    pub current_amplitude: f32,
    pub is_silent: bool,
}

impl OscillatorState {
    pub fn new(initial_frequency: f32) -> Self {
        Self {
            phase: 0.0,
            current_frequency: initial_frequency,
            current_amplitude: 0.0,
            is_silent: false,
        }
    }
}

/// Mono wavetable oscillator that glides frequency and amplitude linearly
/// across each block.
///
/// `render` never allocates, locks or blocks.
pub struct WavetableOscillator {
    table: Arc<Wavetable>,
    state: OscillatorState,
    silence_epsilon: f32,
}

impl WavetableOscillator {
    pub fn new(table: Arc<Wavetable>, initial_frequency: f32) -> Self {
        Self {
            table,
            state: OscillatorState::new(initial_frequency),
            silence_epsilon: SILENCE_EPSILON,
        }
    }

    pub fn with_silence_epsilon(mut self, epsilon: f32) -> Self {
        self.silence_epsilon = epsilon;
        self
    }

    pub fn state(&self) -> &OscillatorState {
        &self.state
    }

    pub fn table(&self) -> &Wavetable {
        &self.table
    }

    pub fn is_silent(&self) -> bool {
        self.state.is_silent
    }

    /// Fill `output` (mono, one sample per frame) from a single parameter
    /// snapshot. An empty buffer is a no-op.
    pub fn render(&mut self, output: &mut [f32], params: ParameterSnapshot, sample_rate: f32) {
        self.render_observed(output, params, sample_rate, |_| {});
    }

    /// `render`, calling `observe` with the state after every ramped sample.
    #[inline]
    fn render_observed(
        &mut self,
        output: &mut [f32],
        params: ParameterSnapshot,
        sample_rate: f32,
        mut observe: impl FnMut(&OscillatorState),
    ) {
        let frames = output.len();
        if frames == 0 {
            return;
        }

        let target_amp = params.target_amplitude;
        let target_freq = params.target_frequency;
        let gain = params.master_gain;
        let eps = self.silence_epsilon;
        let state = &mut self.state;

        if target_amp <= eps && state.current_amplitude <= eps {
            output.fill(0.0);
            state.current_amplitude = 0.0;
            state.is_silent = true;
            return;
        }
        state.is_silent = false;

        let amp_step = (target_amp - state.current_amplitude) / frames as f32;
        let freq_step = (target_freq - state.current_frequency) / frames as f32;
        let table = &*self.table;
        let size = table.size_f64();
        let phase_scalar = table.phase_scalar(sample_rate as f64);

        for out in output.iter_mut() {
            state.current_amplitude += amp_step;
            state.current_frequency += freq_step;

            *out = table.lookup(state.phase) * state.current_amplitude * gain;

            state.phase += state.current_frequency as f64 * phase_scalar;
            if state.phase >= size {
                state.phase -= size;
            }
            // Only reachable with out-of-range frequencies written by a caller.
            if !(0.0..size).contains(&state.phase) {
                state.phase = wrap_phase(state.phase, size);
            }
            observe(&*state);
        }

        // Snap to the exact targets so rounding never accumulates across blocks.
        state.current_amplitude = target_amp;
        state.current_frequency = target_freq;
    }

    /// Discard the ramp state, as after a stop/start cycle.
    pub fn reset(&mut self, initial_frequency: f32) {
        self.state = OscillatorState::new(initial_frequency);
    }
}

#[cold]
fn wrap_phase(phase: f64, size: f64) -> f64 {
    if !phase.is_finite() {
        return 0.0;
    }
    let wrapped = phase.rem_euclid(size);
    // rem_euclid can round up to `size` for tiny negative inputs.
    if wrapped >= size { 0.0 } else { wrapped }
}
