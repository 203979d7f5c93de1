//! Scroll anchors across geometry changes
//!
//! An anchor is a scale-independent bookmark: page index plus percentage
//! offsets within that page's box. The reader captures one immediately before
//! a zoom request and consumes it exactly once after the next geometry batch
//! resolves, so the point the user was looking at stays put while every page
//! size changes underneath it.

use std::time::Instant;

use log::debug;

use crate::geometry::{PageGeometry, offset_for_index_and_percentage};
use crate::virtualizer::{Align, ScrollBehavior, Virtualizer};

/// A viewport-relative point, in pixels from the top-left corner
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportPoint {
    pub top: f32,
    pub left: f32,
}

/// Scale-independent bookmark: page index + percentage offsets
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollAnchor {
    /// Zero-based page index
    pub index: usize,
    /// Vertical offset within the item, 0..=100 (can exceed 100 inside the
    /// trailing gap lane)
    pub percentage_offset_y: f32,
    /// Horizontal offset relative to the centered page box
    pub percentage_offset_x: f32,
}

/// Converts viewport points to anchors and back
#[derive(Debug)]
pub struct AnchorResolver {
    /// Fixed horizontal padding around the page's rendered box
    extra_page_width: f32,
}

impl AnchorResolver {
    #[must_use]
    pub fn new(extra_page_width: f32) -> Self {
        Self { extra_page_width }
    }

    /// Resolve a viewport point (default: viewport center) into an anchor
    ///
    /// Returns `None` when geometry is unavailable or the point resolves to
    /// no item; callers treat that as "nothing to preserve", never an error.
    #[must_use]
    pub fn capture(
        &self,
        virtualizer: &Virtualizer,
        geometry: &[PageGeometry],
        point: Option<ViewportPoint>,
    ) -> Option<ScrollAnchor> {
        let viewport = virtualizer.viewport();
        let point_top = point.map_or(viewport.height / 2.0, |p| p.top);
        let offset = viewport.scroll_top + point_top;

        let item = virtualizer.item_for_offset(offset)?;
        if item.size <= 0.0 {
            return None;
        }
        let percentage_offset_y = (offset - item.start) / item.size * 100.0;

        let page = geometry.get(item.index)?;
        let inner_width = page.width + self.extra_page_width;
        if inner_width <= 0.0 {
            return None;
        }
        // The page box is horizontally centered in the content area.
        let page_left = (viewport.width - inner_width) / 2.0;
        let point_left = point.map_or(viewport.width / 2.0, |p| p.left);
        let absolute_x = viewport.scroll_left + point_left;
        let percentage_offset_x = (absolute_x - page_left) / inner_width * 100.0;

        Some(ScrollAnchor {
            index: item.index,
            percentage_offset_y,
            percentage_offset_x,
        })
    }

    /// Re-apply an anchor against freshly measured geometry
    ///
    /// Scrolls without animation, centering the anchored offset in the
    /// viewport (the capture default), then recenters horizontally from the
    /// same percentage against the new page box. Out-of-range anchors are a
    /// silent no-op.
    pub fn restore(
        &self,
        anchor: &ScrollAnchor,
        virtualizer: &mut Virtualizer,
        geometry: &[PageGeometry],
        now: Instant,
    ) {
        let Some(item) = virtualizer.item(anchor.index) else {
            debug!("anchor index {} out of range, not restored", anchor.index);
            return;
        };
        let offset =
            offset_for_index_and_percentage(item.size, anchor.percentage_offset_y, item.start);
        virtualizer.scroll_to_offset(offset, Align::Center, ScrollBehavior::Auto, now);

        if let Some(page) = geometry.get(anchor.index) {
            let viewport = virtualizer.viewport();
            let inner_width = page.width + self.extra_page_width;
            let offset_x = inner_width * anchor.percentage_offset_x / 100.0;
            let page_left = (viewport.width - inner_width) / 2.0;
            let target_absolute_x = page_left + offset_x;
            virtualizer.set_scroll_left(target_absolute_x - viewport.width / 2.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn virtualizer_with(sizes: Vec<f32>) -> Virtualizer {
        let mut v = Virtualizer::new(4.0, 1, Duration::from_millis(400));
        v.set_viewport_size(1000.0, 600.0);
        v.measure(sizes);
        v.set_enabled(true);
        v
    }

    fn pages(count: usize, width: f32, height: f32) -> Vec<PageGeometry> {
        vec![PageGeometry::new(width, height); count]
    }

    #[test]
    fn capture_defaults_to_viewport_center() {
        let mut v = virtualizer_with(vec![800.0; 10]);
        v.set_scroll_top(1604.0);
        let resolver = AnchorResolver::new(5.0);

        let anchor = resolver.capture(&v, &pages(10, 600.0, 800.0), None).unwrap();
        assert_eq!(anchor.index, 2);
        assert!((anchor.percentage_offset_y - 37.0).abs() < 1e-3);
        assert!((anchor.percentage_offset_x - 50.0).abs() < 1e-3);
    }

    #[test]
    fn capture_at_explicit_point() {
        let mut v = virtualizer_with(vec![800.0; 10]);
        v.set_scroll_top(804.0);
        let resolver = AnchorResolver::new(5.0);

        let point = ViewportPoint {
            top: 200.0,
            left: 197.5,
        };
        let anchor = resolver
            .capture(&v, &pages(10, 600.0, 800.0), Some(point))
            .unwrap();
        assert_eq!(anchor.index, 1);
        assert!((anchor.percentage_offset_y - 25.0).abs() < 1e-3);
        // 197.5 is exactly the page box's left edge.
        assert!(anchor.percentage_offset_x.abs() < 1e-3);
    }

    #[test]
    fn capture_without_geometry_is_empty() {
        let v = virtualizer_with(vec![800.0; 10]);
        let resolver = AnchorResolver::new(5.0);
        assert!(resolver.capture(&v, &[], None).is_none());
    }

    #[test]
    fn capture_while_disabled_is_empty() {
        let mut v = virtualizer_with(vec![800.0; 10]);
        v.set_enabled(false);
        let resolver = AnchorResolver::new(5.0);
        assert!(resolver.capture(&v, &pages(10, 600.0, 800.0), None).is_none());
    }

    #[test]
    fn round_trip_survives_doubling_the_scale() {
        let resolver = AnchorResolver::new(5.0);
        let now = Instant::now();

        let mut v = virtualizer_with(vec![800.0; 10]);
        v.set_scroll_top(1604.0);
        let before = resolver.capture(&v, &pages(10, 600.0, 800.0), None).unwrap();

        // Scale doubles: every page size doubles.
        v.measure(vec![1600.0; 10]);
        let rescaled = pages(10, 1200.0, 1600.0);
        resolver.restore(&before, &mut v, &rescaled, now);

        let after = resolver.capture(&v, &rescaled, None).unwrap();
        assert_eq!(after.index, before.index);
        assert!((after.percentage_offset_y - before.percentage_offset_y).abs() < 0.5);
        assert!((after.percentage_offset_x - before.percentage_offset_x).abs() < 0.5);
    }

    #[test]
    fn round_trip_survives_shrinking_the_scale() {
        let resolver = AnchorResolver::new(5.0);
        let now = Instant::now();

        let mut v = virtualizer_with(vec![1600.0; 10]);
        v.set_scroll_top(5000.0);
        let before = resolver.capture(&v, &pages(10, 1200.0, 1600.0), None).unwrap();

        v.measure(vec![560.0; 10]);
        let rescaled = pages(10, 420.0, 560.0);
        resolver.restore(&before, &mut v, &rescaled, now);

        let after = resolver.capture(&v, &rescaled, None).unwrap();
        assert_eq!(after.index, before.index);
        assert!((after.percentage_offset_y - before.percentage_offset_y).abs() < 0.5);
    }

    #[test]
    fn restore_with_out_of_range_index_is_a_no_op() {
        let resolver = AnchorResolver::new(5.0);
        let now = Instant::now();
        let mut v = virtualizer_with(vec![800.0; 10]);
        v.set_scroll_top(1000.0);

        let anchor = ScrollAnchor {
            index: 42,
            percentage_offset_y: 50.0,
            percentage_offset_x: 50.0,
        };
        resolver.restore(&anchor, &mut v, &pages(10, 600.0, 800.0), now);
        assert_eq!(v.scroll_top(), 1000.0);
    }
}
