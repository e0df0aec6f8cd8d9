//! Debounced stillness detection.
//!
//! A run of `threshold` consecutive still samples requests one suspend.
//! The first moving sample after that requests one resume. Wake is not
//! debounced.

use flux_core::config::StillnessConfig;

use crate::audio_device::PowerControl;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StillnessState {
    Active,
    Sleeping,
}

/// Finer view of [`StillnessState`] that exposes the debounce count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StillnessPhase {
    Active,
    Counting(u32),
    Sleeping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerRequest {
    Suspend,
    Resume,
}

#[derive(Debug, Clone)]
pub struct StillnessTracker {
    /// Bounded to `[0, threshold]`.
    counter: u32,
    threshold: u32,
    cutoff: f32,
}

impl StillnessTracker {
    pub const DEFAULT_THRESHOLD: u32 = 50;
    pub const DEFAULT_CUTOFF: f32 = 0.1;

    /// `threshold` is raised to 1 if zero.
    pub fn new(cutoff: f32, threshold: u32) -> Self {
        Self {
            counter: 0,
            threshold: threshold.max(1),
            cutoff,
        }
    }

    pub fn from_config(config: &StillnessConfig) -> Self {
        Self::new(config.cutoff, config.threshold)
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn state(&self) -> StillnessState {
        if self.counter >= self.threshold {
            StillnessState::Sleeping
        } else {
            StillnessState::Active
        }
    }

    pub fn phase(&self) -> StillnessPhase {
        match self.counter {
            0 => StillnessPhase::Active,
            n if n >= self.threshold => StillnessPhase::Sleeping,
            n => StillnessPhase::Counting(n),
        }
    }

    /// Advance on one smoothed magnitude and report the hardware request
    /// this sample triggers, if any.
    pub fn update(&mut self, smoothed: f32) -> Option<PowerRequest> {
        if smoothed < self.cutoff {
            if self.counter >= self.threshold {
                return None;
            }
            self.counter += 1;
            (self.counter == self.threshold).then_some(PowerRequest::Suspend)
        } else {
            let was_sleeping = self.counter >= self.threshold;
            self.counter = 0;
            was_sleeping.then_some(PowerRequest::Resume)
        }
    }

    /// [`update`](Self::update), dispatching the request to `power`.
    pub fn update_with(&mut self, smoothed: f32, power: &dyn PowerControl) -> Option<PowerRequest> {
        let request = self.update(smoothed);
        match request {
            Some(PowerRequest::Suspend) => power.suspend(),
            Some(PowerRequest::Resume) => power.resume(),
            None => {}
        }
        request
    }
}

impl Default for StillnessTracker {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CUTOFF, Self::DEFAULT_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingPower {
        suspends: AtomicUsize,
        resumes: AtomicUsize,
    }

    impl PowerControl for CountingPower {
        fn suspend(&self) {
            self.suspends.fetch_add(1, Ordering::SeqCst);
        }

        fn resume(&self) {
            self.resumes.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl CountingPower {
        fn counts(&self) -> (usize, usize) {
            (
                self.suspends.load(Ordering::SeqCst),
                self.resumes.load(Ordering::SeqCst),
            )
        }
    }

    #[test]
    fn test_initial_state() {
        let tracker = StillnessTracker::default();
        assert_eq!(tracker.state(), StillnessState::Active);
        assert_eq!(tracker.phase(), StillnessPhase::Active);
        assert_eq!(tracker.counter(), 0);
    }

    #[test]
    fn test_debounce_49_then_50() {
        let power = CountingPower::default();
        let mut tracker = StillnessTracker::default();

        for _ in 0..49 {
            assert_eq!(tracker.update_with(0.05, &power), None);
        }
        assert_eq!(power.counts(), (0, 0));
        assert_eq!(tracker.phase(), StillnessPhase::Counting(49));

        assert_eq!(tracker.update_with(0.05, &power), Some(PowerRequest::Suspend));
        assert_eq!(power.counts(), (1, 0));
        assert_eq!(tracker.state(), StillnessState::Sleeping);
    }

    #[test]
    fn test_further_still_samples_do_not_resuspend() {
        let power = CountingPower::default();
        let mut tracker = StillnessTracker::default();
        for _ in 0..500 {
            tracker.update_with(0.0, &power);
        }
        assert_eq!(power.counts(), (1, 0));
        assert_eq!(tracker.counter(), tracker.threshold());
    }

    #[test]
    fn test_wake_is_immediate() {
        let power = CountingPower::default();
        let mut tracker = StillnessTracker::default();
        for _ in 0..50 {
            tracker.update_with(0.05, &power);
        }

        assert_eq!(tracker.update_with(0.5, &power), Some(PowerRequest::Resume));
        assert_eq!(power.counts(), (1, 1));
        assert_eq!(tracker.counter(), 0);
        assert_eq!(tracker.state(), StillnessState::Active);
    }

    #[test]
    fn test_motion_while_active_never_resumes() {
        let power = CountingPower::default();
        let mut tracker = StillnessTracker::default();
        for _ in 0..10 {
            tracker.update_with(0.5, &power);
        }
        for _ in 0..20 {
            tracker.update_with(0.05, &power);
        }
        tracker.update_with(0.5, &power);
        assert_eq!(power.counts(), (0, 0));
        assert_eq!(tracker.counter(), 0);
    }

    #[test]
    fn test_noise_near_cutoff_resets_debounce() {
        let power = CountingPower::default();
        let mut tracker = StillnessTracker::default();
        for i in 0..200 {
            // A moving sample every 40 keeps the counter below threshold.
            let m = if i % 40 == 39 { 0.1 } else { 0.09 };
            tracker.update_with(m, &power);
        }
        assert_eq!(power.counts(), (0, 0));
    }

    #[test]
    fn test_cutoff_is_exclusive() {
        let mut tracker = StillnessTracker::new(0.1, 1);
        assert_eq!(tracker.update(0.1), None);
        assert_eq!(tracker.update(0.099), Some(PowerRequest::Suspend));
    }

    #[test]
    fn test_repeated_sleep_wake_cycles() {
        let power = CountingPower::default();
        let mut tracker = StillnessTracker::new(0.1, 3);
        for _ in 0..4 {
            for _ in 0..5 {
                tracker.update_with(0.0, &power);
            }
            tracker.update_with(1.0, &power);
        }
        assert_eq!(power.counts(), (4, 4));
    }
}
