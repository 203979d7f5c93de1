//! Pure offset math for the scroll engine
//!
//! Conversions between item index/percentage positions and pixel offsets,
//! plus the easing curve used by smooth scrolling. Everything here is
//! side-effect free; stateful pieces live in the virtualizer and animator.

/// Page size at the current scale, as reported by the document provider
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    /// Rendered width in pixels
    pub width: f32,
    /// Rendered height in pixels
    pub height: f32,
}

impl PageGeometry {
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Quintic ease-out: fast start, long settle
///
/// `t` is expected in `[0, 1]`; values outside are clamped.
#[must_use]
pub fn ease_out_quint(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(5)
}

/// Pixel offset of a percentage position inside an item
///
/// `percentage` is `0..=100` measured from the item's top edge; `start_offset`
/// is the item's cumulative start in document space.
#[must_use]
pub fn offset_for_index_and_percentage(item_size: f32, percentage: f32, start_offset: f32) -> f32 {
    start_offset + item_size * percentage / 100.0
}

/// Pixel offset of a highlight's top edge within an item
///
/// `top` is the highlight's top as a percentage of the item height. Callers
/// shrink `item_size`/`start_offset` by the configured margins before calling.
#[must_use]
pub fn offset_for_highlight(top: f32, item_size: f32, start_offset: f32) -> f32 {
    start_offset + item_size * top / 100.0
}
