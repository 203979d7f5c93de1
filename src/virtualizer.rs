//! Virtualized window over variable-height pages
//!
//! Given measured page sizes, a gap, and an overscan count, computes which
//! page indices intersect the viewport and their cumulative pixel offsets.
//! The virtualizer owns the viewport scroll state and the scroll animator;
//! collaborators read offsets through it and scroll through
//! `scroll_to_index`/`scroll_to_offset`.
//!
//! Offset lookups walk the size list (O(n) per call). Page counts are bounded
//! and the calls are command-driven, not per-frame, so prefix-sum caching is
//! not worth the invalidation bookkeeping.

use std::time::{Duration, Instant};

use log::debug;

use crate::animator::ScrollAnimator;

/// One live entry of the virtual window
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VirtualItem {
    /// Zero-based page index
    pub index: usize,
    /// Cumulative pixel offset of the item's top edge
    pub start: f32,
    /// Item height in pixels
    pub size: f32,
}

/// Which edge of the target aligns with the viewport
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Start,
    Center,
    End,
    /// Scroll the minimum distance that brings the target fully into view
    Auto,
}

/// Whether a scroll command animates or jumps
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ScrollBehavior {
    /// Eased transition through the scroll animator
    #[default]
    Smooth,
    /// Immediate jump
    Auto,
}

/// Scrollable viewport state
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub scroll_top: f32,
    pub scroll_left: f32,
}

/// Visible-window computation over measured page sizes
#[derive(Debug)]
pub struct Virtualizer {
    sizes: Vec<f32>,
    gap: f32,
    overscan: usize,
    enabled: bool,
    viewport: Viewport,
    /// Horizontal content extent (widest page box); bounds `scroll_left`
    content_width: f32,
    animator: ScrollAnimator,
}

impl Virtualizer {
    #[must_use]
    pub fn new(gap: f32, overscan: usize, animation_duration: Duration) -> Self {
        Self {
            sizes: Vec::new(),
            gap: gap.max(0.0),
            overscan,
            enabled: false,
            viewport: Viewport::default(),
            content_width: 0.0,
            animator: ScrollAnimator::new(animation_duration),
        }
    }

    /// Replace measured sizes, e.g. after a geometry batch resolves
    ///
    /// Re-clamps the scroll position against the new total size.
    pub fn measure(&mut self, sizes: Vec<f32>) {
        self.sizes = sizes;
        self.viewport.scroll_top = self.clamp_scroll(self.viewport.scroll_top);
        debug!(
            "virtualizer measured {} items, total {:.0}px",
            self.sizes.len(),
            self.content_size()
        );
    }

    /// Drop all measurements and disable, e.g. on document change
    pub fn clear(&mut self) {
        self.sizes.clear();
        self.enabled = false;
        self.viewport.scroll_top = 0.0;
        self.viewport.scroll_left = 0.0;
        self.content_width = 0.0;
        self.animator.cancel();
    }

    /// Set the horizontal content extent; re-clamps `scroll_left`
    pub fn set_content_width(&mut self, width: f32) {
        self.content_width = width.max(0.0);
        self.viewport.scroll_left = self.clamp_scroll_left(self.viewport.scroll_left);
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.sizes.len()
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport_size(&mut self, width: f32, height: f32) {
        self.viewport.width = width.max(0.0);
        self.viewport.height = height.max(0.0);
        self.viewport.scroll_top = self.clamp_scroll(self.viewport.scroll_top);
        self.viewport.scroll_left = self.clamp_scroll_left(self.viewport.scroll_left);
    }

    #[must_use]
    pub fn scroll_top(&self) -> f32 {
        self.viewport.scroll_top
    }

    #[must_use]
    pub fn scroll_left(&self) -> f32 {
        self.viewport.scroll_left
    }

    /// Direct scroll write (user input); cancels any running animation
    pub fn set_scroll_top(&mut self, offset: f32) {
        self.animator.cancel();
        self.viewport.scroll_top = self.clamp_scroll(offset);
    }

    /// Horizontal scroll write; clamped to the horizontal content extent
    pub fn set_scroll_left(&mut self, offset: f32) {
        self.viewport.scroll_left = self.clamp_scroll_left(offset);
    }

    /// Total content height: `Σ size(i) + gap·(n−1)`; zero while disabled
    #[must_use]
    pub fn total_size(&self) -> f32 {
        if !self.enabled {
            return 0.0;
        }
        self.content_size()
    }

    #[must_use]
    pub fn size_of(&self, index: usize) -> Option<f32> {
        self.sizes.get(index).copied()
    }

    /// Cumulative start offset of `index` via prefix sum
    #[must_use]
    pub fn offset_for_index(&self, index: usize) -> Option<f32> {
        if index >= self.sizes.len() {
            return None;
        }
        let mut offset = 0.0;
        for size in &self.sizes[..index] {
            offset += size + self.gap;
        }
        Some(offset)
    }

    /// The virtual item at `index`
    #[must_use]
    pub fn item(&self, index: usize) -> Option<VirtualItem> {
        Some(VirtualItem {
            index,
            start: self.offset_for_index(index)?,
            size: self.sizes[index],
        })
    }

    /// The item containing a document-space pixel offset
    ///
    /// The gap below an item belongs to that item's lane, so every offset in
    /// `[0, content_size]` resolves to exactly one item. Offsets outside the
    /// content clamp to the first/last item. `None` while disabled or empty.
    #[must_use]
    pub fn item_for_offset(&self, offset: f32) -> Option<VirtualItem> {
        if !self.enabled || self.sizes.is_empty() {
            return None;
        }
        let mut start = 0.0;
        for (index, &size) in self.sizes.iter().enumerate() {
            let lane_end = start + size + self.gap;
            if offset < lane_end {
                return Some(VirtualItem { index, start, size });
            }
            start = lane_end;
        }
        self.item(self.sizes.len() - 1)
    }

    /// Contiguous index range intersecting the viewport, overscan included
    #[must_use]
    pub fn visible_range(&self) -> Option<(usize, usize)> {
        if !self.enabled || self.sizes.is_empty() {
            return None;
        }
        let top = self.viewport.scroll_top;
        let bottom = top + self.viewport.height;
        let first = self.item_for_offset(top)?.index;
        let last = self.item_for_offset(bottom)?.index;
        Some((
            first.saturating_sub(self.overscan),
            (last + self.overscan).min(self.sizes.len() - 1),
        ))
    }

    /// Ordered items of the current visible window; empty while disabled
    #[must_use]
    pub fn visible_items(&self) -> Vec<VirtualItem> {
        let Some((first, last)) = self.visible_range() else {
            return Vec::new();
        };
        let mut items = Vec::with_capacity(last - first + 1);
        let mut start = match self.offset_for_index(first) {
            Some(start) => start,
            None => return Vec::new(),
        };
        for index in first..=last {
            let size = self.sizes[index];
            items.push(VirtualItem { index, start, size });
            start += size + self.gap;
        }
        items
    }

    /// Scroll so that page `index` is positioned per `align`
    pub fn scroll_to_index(
        &mut self,
        index: usize,
        align: Align,
        behavior: ScrollBehavior,
        now: Instant,
    ) {
        if !self.enabled {
            return;
        }
        let Some(item) = self.item(index) else {
            debug!("scroll_to_index({index}) out of range, ignored");
            return;
        };
        let target = match align {
            Align::Start => item.start,
            Align::Center => item.start + item.size / 2.0 - self.viewport.height / 2.0,
            Align::End => item.start + item.size - self.viewport.height,
            Align::Auto => {
                let top = self.viewport.scroll_top;
                let bottom = top + self.viewport.height;
                if item.start >= top && item.start + item.size <= bottom {
                    return;
                }
                if item.start < top {
                    item.start
                } else {
                    item.start + item.size - self.viewport.height
                }
            }
        };
        self.scroll_to_clamped(target, behavior, now);
    }

    /// Scroll to an absolute pixel offset, aligned per `align`
    pub fn scroll_to_offset(
        &mut self,
        offset: f32,
        align: Align,
        behavior: ScrollBehavior,
        now: Instant,
    ) {
        if !self.enabled {
            return;
        }
        let target = match align {
            Align::Start | Align::Auto => offset,
            Align::Center => offset - self.viewport.height / 2.0,
            Align::End => offset - self.viewport.height,
        };
        self.scroll_to_clamped(target, behavior, now);
    }

    /// Advance the scroll animation; returns true when the offset moved
    pub fn tick(&mut self, now: Instant) -> bool {
        if let Some(offset) = self.animator.tick(now) {
            self.viewport.scroll_top = self.clamp_scroll(offset);
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.animator.is_active()
    }

    fn scroll_to_clamped(&mut self, target: f32, behavior: ScrollBehavior, now: Instant) {
        let target = self.clamp_scroll(target);
        match behavior {
            ScrollBehavior::Auto => {
                self.animator.cancel();
                self.viewport.scroll_top = target;
            }
            ScrollBehavior::Smooth => {
                self.animator.animate_to(self.viewport.scroll_top, target, now);
            }
        }
    }

    fn content_size(&self) -> f32 {
        if self.sizes.is_empty() {
            return 0.0;
        }
        let total: f32 = self.sizes.iter().sum();
        total + self.gap * (self.sizes.len() - 1) as f32
    }

    fn clamp_scroll(&self, offset: f32) -> f32 {
        let max = (self.content_size() - self.viewport.height).max(0.0);
        offset.clamp(0.0, max)
    }

    fn clamp_scroll_left(&self, offset: f32) -> f32 {
        let max = (self.content_width - self.viewport.width).max(0.0);
        offset.clamp(0.0, max)
    }
}
