//! Smooth scroll animation
//!
//! Drives a cancellable, eased transition of the scroll position toward a
//! target offset. Cancellation uses a generation counter: every `animate_to`
//! stamps a fresh generation, and a frame carrying a stale generation is
//! dropped silently. Starting a new animation therefore cancels any prior one
//! without explicit bookkeeping. Instant (`Auto`) scrolls bypass this type
//! entirely; the virtualizer writes the offset directly.

use std::time::{Duration, Instant};

use crate::geometry::ease_out_quint;

#[derive(Clone, Copy, Debug)]
struct Animation {
    generation: u64,
    start_offset: f32,
    target: f32,
    started: Instant,
}

/// Eased scroll transition with generation-counter cancellation
#[derive(Debug)]
pub struct ScrollAnimator {
    duration: Duration,
    generation: u64,
    active: Option<Animation>,
}

impl ScrollAnimator {
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            duration: duration.max(Duration::from_millis(1)),
            generation: 0,
            active: None,
        }
    }

    /// Start an animation from `from` toward `target`, superseding any
    /// animation already in flight
    pub fn animate_to(&mut self, from: f32, target: f32, now: Instant) {
        self.generation += 1;
        self.active = Some(Animation {
            generation: self.generation,
            start_offset: from,
            target,
            started: now,
        });
    }

    /// Stop without reaching the target
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.active = None;
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.active, Some(a) if a.generation == self.generation)
    }

    /// Target of the animation in flight, if any
    #[must_use]
    pub fn target(&self) -> Option<f32> {
        self.active
            .filter(|a| a.generation == self.generation)
            .map(|a| a.target)
    }

    /// Advance one frame; returns the offset to apply, or `None` when idle
    ///
    /// Snaps exactly to the target once the duration has elapsed, then goes
    /// idle.
    pub fn tick(&mut self, now: Instant) -> Option<f32> {
        let animation = self.active?;
        if animation.generation != self.generation {
            self.active = None;
            return None;
        }

        let elapsed = now.saturating_duration_since(animation.started);
        if elapsed >= self.duration {
            self.active = None;
            return Some(animation.target);
        }

        let progress = ease_out_quint(elapsed.as_secs_f32() / self.duration.as_secs_f32());
        Some(animation.start_offset + (animation.target - animation.start_offset) * progress)
    }
}
