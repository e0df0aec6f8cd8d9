//! Synthetic motion source for hosts without a linear acceleration sensor.

use std::f32::consts::TAU;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use flux_backend::sensor::MotionFeed;
use flux_core::Acceleration;

use crate::cli::MotionPattern;

pub struct MotionSimulator {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl MotionSimulator {
    /// Push one reading every `interval` until dropped.
    pub fn spawn(feed: MotionFeed, pattern: MotionPattern, interval: Duration) -> std::io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let thread = thread::Builder::new()
            .name("flux-motion-sim".into())
            .spawn(move || {
                let dt = interval.as_secs_f32();
                let mut t = 0.0f32;
                while !thread_stop.load(Ordering::Relaxed) {
                    if !feed.push(reading(pattern, t)) {
                        tracing::trace!("motion queue full; reading dropped");
                    }
                    t += dt;
                    thread::sleep(interval);
                }
            })?;
        Ok(Self {
            stop,
            thread: Some(thread),
        })
    }
}

impl Drop for MotionSimulator {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Acceleration at time `t` seconds.
fn reading(pattern: MotionPattern, t: f32) -> Acceleration {
    match pattern {
        MotionPattern::Still => Acceleration::default(),
        MotionPattern::Sway => {
            let a = 0.6 + 0.4 * (TAU * 0.25 * t).sin();
            Acceleration::new(a, 0.3 * (TAU * 0.5 * t).cos(), 0.0)
        }
        MotionPattern::Bursts => {
            // 4 s of movement, then 6 s still: long enough to trip the suspend.
            let cycle = t % 10.0;
            if cycle < 4.0 {
                let a = 1.5 * (TAU * 1.5 * cycle).sin().abs();
                Acceleration::new(a, 0.5 * a, 0.2)
            } else {
                Acceleration::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_still_pattern_is_zero() {
        assert_eq!(reading(MotionPattern::Still, 3.0).magnitude(), 0.0);
    }

    #[test]
    fn test_bursts_alternate() {
        assert!(reading(MotionPattern::Bursts, 0.15).magnitude() > 0.1);
        assert_eq!(reading(MotionPattern::Bursts, 7.0).magnitude(), 0.0);
        assert!(reading(MotionPattern::Bursts, 10.15).magnitude() > 0.1);
    }

    #[test]
    fn test_sway_never_still() {
        for i in 0..100 {
            assert!(reading(MotionPattern::Sway, i as f32 * 0.04).magnitude() >= 0.2);
        }
    }
}
