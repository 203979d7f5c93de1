//! Scroll velocity sampling
//!
//! Samples the scroll offset on a fixed interval and normalizes the delta by
//! a reference item size, so "fast" means roughly the same thing regardless
//! of zoom level or document. The value feeds the render gate, not physics.

use std::time::{Duration, Instant};

/// Interval-sampled, normalized scroll speed
#[derive(Debug)]
pub struct VelocityMonitor {
    interval: Duration,
    last_sample: Option<Instant>,
    last_offset: f32,
    normalized: f32,
}

impl VelocityMonitor {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            last_sample: None,
            last_offset: 0.0,
            normalized: 0.0,
        }
    }

    /// Feed the current scroll offset; updates the velocity once per interval
    ///
    /// `reference_size` is the estimated size of item 0, used purely as a
    /// normalization constant.
    pub fn sample(&mut self, offset: f32, reference_size: f32, now: Instant) {
        match self.last_sample {
            None => {
                self.last_sample = Some(now);
                self.last_offset = offset;
            }
            Some(last) if now.saturating_duration_since(last) >= self.interval => {
                let reference = reference_size.max(1.0);
                self.normalized = (offset - self.last_offset) / reference;
                self.last_sample = Some(now);
                self.last_offset = offset;
            }
            Some(_) => {}
        }
    }

    /// Velocity in item-0 heights per sampling interval; signed
    #[must_use]
    pub fn normalized_velocity(&self) -> f32 {
        self.normalized
    }

    #[must_use]
    pub fn is_fast(&self, threshold: f32) -> bool {
        self.normalized.abs() > threshold
    }

    /// Forget history, e.g. on document change
    pub fn reset(&mut self) {
        self.last_sample = None;
        self.last_offset = 0.0;
        self.normalized = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(50);

    #[test]
    fn forward_scroll_yields_positive_velocity() {
        let mut m = VelocityMonitor::new(INTERVAL);
        let start = Instant::now();
        m.sample(0.0, 800.0, start);
        m.sample(400.0, 800.0, start + INTERVAL);
        assert_eq!(m.normalized_velocity(), 0.5);
    }

    #[test]
    fn backward_scroll_yields_negative_velocity() {
        let mut m = VelocityMonitor::new(INTERVAL);
        let start = Instant::now();
        m.sample(2000.0, 800.0, start);
        m.sample(1200.0, 800.0, start + INTERVAL);
        assert_eq!(m.normalized_velocity(), -1.0);
    }

    #[test]
    fn holding_still_decays_to_zero() {
        let mut m = VelocityMonitor::new(INTERVAL);
        let start = Instant::now();
        m.sample(0.0, 800.0, start);
        m.sample(1600.0, 800.0, start + INTERVAL);
        assert!(m.is_fast(1.0));

        m.sample(1600.0, 800.0, start + INTERVAL * 2);
        assert_eq!(m.normalized_velocity(), 0.0);
        assert!(!m.is_fast(1.0));
    }

    #[test]
    fn samples_within_the_interval_are_ignored() {
        let mut m = VelocityMonitor::new(INTERVAL);
        let start = Instant::now();
        m.sample(0.0, 800.0, start);
        m.sample(5000.0, 800.0, start + Duration::from_millis(10));
        assert_eq!(m.normalized_velocity(), 0.0);
    }

    #[test]
    fn zero_reference_size_does_not_divide_by_zero() {
        let mut m = VelocityMonitor::new(INTERVAL);
        let start = Instant::now();
        m.sample(0.0, 0.0, start);
        m.sample(100.0, 0.0, start + INTERVAL);
        assert_eq!(m.normalized_velocity(), 100.0);
    }

    #[test]
    fn reset_clears_state() {
        let mut m = VelocityMonitor::new(INTERVAL);
        let start = Instant::now();
        m.sample(0.0, 800.0, start);
        m.sample(800.0, 800.0, start + INTERVAL);
        m.reset();
        assert_eq!(m.normalized_velocity(), 0.0);
    }
}
