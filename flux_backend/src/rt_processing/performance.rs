use std::sync::atomic::{AtomicU64, Ordering};

use quanta::{Clock, Instant as QuantaInstant};

/// Snapshot of render metrics for diagnostics (non-RT).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSnapshot {
    /// Frames rendered since creation.
    pub frames_rendered: u64,
    /// Callbacks since creation. Unaffected by [`RenderTelemetry::take_callback_count`].
    pub total_callbacks: u64,
    /// Longest callback observed (ns), if any.
    pub max_callback_nanos: Option<u64>,
    /// EMA of callback duration in nanoseconds.
    pub ema_callback_nanos: f64,
}

/// Render-side counters.
///
/// The render thread only touches atomics through `scoped_callback` and
/// `add_frames`. Everything else is for the control or telemetry side.
pub struct RenderTelemetry {
    clock: Clock,
    /// Callbacks since the last `take_callback_count`.
    callbacks_since_read: AtomicU64,
    total_callbacks: AtomicU64,
    frames_rendered: AtomicU64,
    max_callback_nanos: AtomicU64,
    /// EMA stored as f64 bits.
    ema_callback_bits: AtomicU64,
    ema_alpha: f64,
}

impl RenderTelemetry {
    pub fn new() -> Self {
        Self::with_ema_alpha(0.1)
    }

    /// `ema_alpha` in `(0, 1]`; values outside are clamped.
    pub fn with_ema_alpha(ema_alpha: f64) -> Self {
        Self {
            clock: Clock::new(),
            callbacks_since_read: AtomicU64::new(0),
            total_callbacks: AtomicU64::new(0),
            frames_rendered: AtomicU64::new(0),
            max_callback_nanos: AtomicU64::new(0),
            ema_callback_bits: AtomicU64::new(0),
            ema_alpha: ema_alpha.clamp(f64::MIN_POSITIVE, 1.0),
        }
    }

    #[inline(always)]
    pub fn add_frames(&self, n: u64) {
        self.frames_rendered.fetch_add(n, Ordering::Relaxed);
    }

    /// Count one callback and time it until the guard drops.
    #[inline(always)]
    pub fn scoped_callback(&self) -> CallbackGuard<'_> {
        self.callbacks_since_read.fetch_add(1, Ordering::Relaxed);
        self.total_callbacks.fetch_add(1, Ordering::Relaxed);
        CallbackGuard {
            telemetry: self,
            start: self.clock.now(),
        }
    }

    #[inline(always)]
    fn record_callback_duration_nanos(&self, nanos: u64) {
        self.max_callback_nanos.fetch_max(nanos, Ordering::Relaxed);

        // EMA_new = alpha * x + (1 - alpha) * EMA_old
        let alpha = self.ema_alpha;
        let mut old_bits = self.ema_callback_bits.load(Ordering::Relaxed);
        loop {
            let old = f64::from_bits(old_bits);
            let new = alpha * nanos as f64 + (1.0 - alpha) * old;
            match self.ema_callback_bits.compare_exchange_weak(
                old_bits,
                new.to_bits(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(found) => old_bits = found,
            }
        }
    }

    /// Callbacks since the previous call, resetting the counter to zero.
    pub fn take_callback_count(&self) -> u64 {
        self.callbacks_since_read.swap(0, Ordering::AcqRel)
    }

    pub fn snapshot(&self) -> RenderSnapshot {
        let max = self.max_callback_nanos.load(Ordering::Relaxed);
        RenderSnapshot {
            frames_rendered: self.frames_rendered.load(Ordering::Relaxed),
            total_callbacks: self.total_callbacks.load(Ordering::Relaxed),
            max_callback_nanos: (max != 0).then_some(max),
            ema_callback_nanos: f64::from_bits(self.ema_callback_bits.load(Ordering::Relaxed)),
        }
    }
}

impl Default for RenderTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

/// Records callback latency on drop. Atomics only.
pub struct CallbackGuard<'a> {
    telemetry: &'a RenderTelemetry,
    start: QuantaInstant,
}

impl Drop for CallbackGuard<'_> {
    fn drop(&mut self) {
        let elapsed = self
            .telemetry
            .clock
            .now()
            .saturating_duration_since(self.start)
            .as_nanos();
        let nanos = u64::try_from(elapsed).unwrap_or(u64::MAX);
        self.telemetry.record_callback_duration_nanos(nanos);
    }
}
