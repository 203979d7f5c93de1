//! Discrete zoom control with a debounced setter
//!
//! Stepping moves along a fixed level list; fit-to-width applies a stored
//! arbitrary scale. Every request lands in a single pending slot with a due
//! time ~100ms out; later requests replace the slot and push the due time, so
//! rapid stepping collapses to one applied transition. Each applied scale
//! triggers a full geometry recomputation across all pages, which is what the
//! debounce is protecting.

use std::time::{Duration, Instant};

use log::debug;

/// Fixed ascending zoom multipliers for step zoom
pub const ZOOM_LEVELS: [f32; 15] = [
    0.5, 0.7, 0.8, 0.9, 1.0, 1.1, 1.2, 1.3, 1.5, 1.7, 2.0, 2.5, 3.0, 3.5, 4.0,
];

const SCALE_EPSILON: f32 = 1e-4;

#[derive(Clone, Copy, Debug)]
struct PendingZoom {
    scale: f32,
    due: Instant,
}

/// Outcome of a due pending value
///
/// `Unchanged` settles a request that clamped back to the applied scale
/// (stepping at the ends of the level list, fit-width while already at fit
/// width). Callers must still observe it: a captured anchor waiting on the
/// request has to be released even though no geometry recomputation follows.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ZoomSettled {
    /// The scale transitioned to a new value
    Changed(f32),
    /// The pending value equals the applied scale
    Unchanged,
}

/// Zoom scale state with trailing-debounced application
#[derive(Debug)]
pub struct ZoomController {
    scale: Option<f32>,
    fit_width_scale: Option<f32>,
    pending: Option<PendingZoom>,
    debounce: Duration,
}

impl ZoomController {
    #[must_use]
    pub fn new(debounce: Duration) -> Self {
        Self {
            scale: None,
            fit_width_scale: None,
            pending: None,
            debounce,
        }
    }

    /// Currently applied scale; `None` before the first document resolves
    #[must_use]
    pub fn scale(&self) -> Option<f32> {
        self.scale
    }

    /// Apply a scale immediately, bypassing the debounce (initial load)
    pub fn set_scale_immediate(&mut self, scale: f32) {
        self.scale = Some(scale.max(SCALE_EPSILON));
        self.pending = None;
    }

    /// Remember the fit-to-width scale computed at first page load
    pub fn set_fit_width_scale(&mut self, scale: f32) {
        self.fit_width_scale = Some(scale.max(SCALE_EPSILON));
    }

    #[must_use]
    pub fn fit_width_scale(&self) -> Option<f32> {
        self.fit_width_scale
    }

    /// Pending value if one is scheduled, else the applied scale
    ///
    /// Stepping resolves against this so rapid steps accumulate instead of
    /// recomputing the same target from the not-yet-applied scale.
    #[must_use]
    pub fn effective_scale(&self) -> Option<f32> {
        self.pending.map(|p| p.scale).or(self.scale)
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Step up `levels` entries, clamped to the top of the list
    pub fn increase(&mut self, levels: usize, now: Instant) {
        let Some(current) = self.effective_scale() else {
            return;
        };
        let index = level_index_at_or_above(current);
        let next = (index + levels).min(ZOOM_LEVELS.len() - 1);
        self.request(ZOOM_LEVELS[next], now);
    }

    /// Step down `levels` entries, clamped to the bottom of the list
    pub fn decrease(&mut self, levels: usize, now: Instant) {
        let Some(current) = self.effective_scale() else {
            return;
        };
        let index = level_index_at_or_above(current);
        let prev = index.saturating_sub(levels);
        self.request(ZOOM_LEVELS[prev], now);
    }

    /// Request the stored fit-to-width scale
    pub fn fit_width(&mut self, now: Instant) {
        let Some(fit) = self.fit_width_scale else {
            return;
        };
        self.request(fit, now);
    }

    /// Forget all scale state, e.g. after a failed document load
    pub fn reset(&mut self) {
        self.scale = None;
        self.fit_width_scale = None;
        self.pending = None;
    }

    /// Apply the pending value once due; `None` while nothing is due
    pub fn poll(&mut self, now: Instant) -> Option<ZoomSettled> {
        let pending = self.pending?;
        if now < pending.due {
            return None;
        }
        self.pending = None;
        let changed = match self.scale {
            Some(current) => (current - pending.scale).abs() > SCALE_EPSILON,
            None => true,
        };
        self.scale = Some(pending.scale);
        if changed {
            debug!("zoom applied: {:.3}", pending.scale);
            Some(ZoomSettled::Changed(pending.scale))
        } else {
            Some(ZoomSettled::Unchanged)
        }
    }

    fn request(&mut self, scale: f32, now: Instant) {
        self.pending = Some(PendingZoom {
            scale,
            due: now + self.debounce,
        });
    }
}

/// Index of the first level ≥ `scale`; the last level when `scale` exceeds
/// the whole list
fn level_index_at_or_above(scale: f32) -> usize {
    ZOOM_LEVELS
        .iter()
        .position(|&level| level >= scale - SCALE_EPSILON)
        .unwrap_or(ZOOM_LEVELS.len() - 1)
}
