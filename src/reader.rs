//! Reader orchestrator
//!
//! Composes the virtualizer, zoom controller, anchor resolver, velocity
//! monitor, and render gate into one state machine. The reader exclusively
//! owns page count, geometry, and scale; collaborators only see queries and
//! commands. Operations return effect lists: the host drains them, dispatches geometry requests to its provider or the
//! [`crate::service::GeometryService`], and feeds completions back through
//! [`Reader::geometry_resolved`].
//!
//! Readiness cycles `NotReady -> Computing -> Ready` for the life of the
//! component: a document change drops to `NotReady`, a scale change while
//! `Ready` goes back to `Computing` with the previous geometry still usable,
//! so zooming never flashes an empty viewport.

use std::time::Instant;

use log::{debug, error, info, warn};

use crate::anchor::{AnchorResolver, ScrollAnchor, ViewportPoint};
use crate::config::EngineConfig;
use crate::error::{GeometryError, LoadError};
use crate::gate::{self, GateInputs, RenderDecision};
use crate::geometry::{PageGeometry, offset_for_highlight};
use crate::service::{DocumentInfo, GeometryKey};
use crate::velocity::VelocityMonitor;
use crate::virtualizer::{Align, ScrollBehavior, VirtualItem, Viewport, Virtualizer};
use crate::zoom::{ZoomController, ZoomSettled};

/// Geometry readiness for the current document and scale
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Readiness {
    /// No geometry; virtualization disabled
    #[default]
    NotReady,
    /// A geometry batch is in flight
    Computing,
    /// Geometry valid for the current document and scale
    Ready,
}

/// Highlight rectangle; all fields are percentages of the page box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HighlightArea {
    pub page_index: usize,
    pub top: f32,
    pub left: f32,
    pub width: f32,
    pub height: f32,
}

/// Snapshot of the command surface state, republished via `Effect::ApiChanged`
#[derive(Clone, Debug, PartialEq)]
pub struct ReaderApi {
    /// Current scale; `None` before the first document resolves
    pub scale: Option<f32>,
    pub page_count: usize,
    pub readiness: Readiness,
}

/// Side-channel work requested by an orchestrator operation
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Dispatch a geometry batch for `key` at `scale`
    RequestGeometry {
        key: GeometryKey,
        scale: f32,
        rotation: i32,
    },
    /// Scale, page count, or readiness changed; chrome should re-read `api()`
    ApiChanged,
}

/// One entry of the current render plan
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PagePlacement {
    pub item: VirtualItem,
    /// Rendered page width at the current scale
    pub width: f32,
    pub decision: RenderDecision,
}

#[derive(Debug)]
struct DocumentState {
    id: u64,
    page_count: usize,
    base_page_width: f32,
}

/// The virtualized, zoom-anchored scroll engine
#[derive(Debug)]
pub struct Reader {
    config: EngineConfig,
    rotation: i32,
    document: Option<DocumentState>,
    geometry: Option<Vec<PageGeometry>>,
    readiness: Readiness,
    zoom: ZoomController,
    virtualizer: Virtualizer,
    velocity: VelocityMonitor,
    anchors: AnchorResolver,
    pending_anchor: Option<ScrollAnchor>,
    next_generation: u64,
    expected_geometry: Option<GeometryKey>,
}

impl Reader {
    #[must_use]
    pub fn new(config: EngineConfig, viewport_width: f32, viewport_height: f32) -> Self {
        let mut virtualizer =
            Virtualizer::new(config.gap, config.overscan, config.scroll_duration());
        virtualizer.set_viewport_size(viewport_width, viewport_height);
        Self {
            rotation: 0,
            zoom: ZoomController::new(config.zoom_debounce()),
            velocity: VelocityMonitor::new(config.velocity_interval()),
            anchors: AnchorResolver::new(config.extra_page_width),
            virtualizer,
            config,
            document: None,
            geometry: None,
            readiness: Readiness::NotReady,
            pending_anchor: None,
            next_generation: 0,
            expected_geometry: None,
        }
    }

    // ---- lifecycle -------------------------------------------------------

    /// A document opened; derives the initial and fit-to-width scales and
    /// kicks off the first geometry batch
    pub fn document_opened(&mut self, document: u64, info: &DocumentInfo) -> Vec<Effect> {
        self.reset_document_state();

        let fit_scale = if info.base_page_width > 0.0 {
            self.virtualizer.viewport().width / info.base_page_width
        } else {
            1.0
        };
        self.zoom.set_fit_width_scale(fit_scale);
        let scale = self.config.initial_scale.unwrap_or(fit_scale);
        self.zoom.set_scale_immediate(scale);

        info!(
            "document {document}: {} pages, scale {scale:.3} (fit {fit_scale:.3})",
            info.page_count
        );
        self.document = Some(DocumentState {
            id: document,
            page_count: info.page_count,
            base_page_width: info.base_page_width,
        });
        self.readiness = Readiness::Computing;

        let request = self.request_geometry(scale);
        vec![request, Effect::ApiChanged]
    }

    /// The document failed to open; empty view, no automatic retry
    pub fn document_failed(&mut self, err: &LoadError) -> Vec<Effect> {
        error!("document load failed: {err}");
        self.reset_document_state();
        self.zoom.reset();
        self.document = None;
        vec![Effect::ApiChanged]
    }

    /// A geometry batch completed
    ///
    /// Stale completions (key no longer expected) are discarded. A failed
    /// batch still advances to `Ready` with fallback estimated sizes so the
    /// view never loads forever.
    pub fn geometry_resolved(
        &mut self,
        key: GeometryKey,
        result: Result<Vec<PageGeometry>, GeometryError>,
        now: Instant,
    ) -> Vec<Effect> {
        if self.expected_geometry != Some(key) {
            debug!("discarding stale geometry completion {key:?}");
            return Vec::new();
        }
        self.expected_geometry = None;

        let Some(document) = &self.document else {
            return Vec::new();
        };

        let geometry = match result {
            Ok(geometry) => {
                if geometry.len() != document.page_count {
                    warn!(
                        "geometry batch has {} entries for {} pages",
                        geometry.len(),
                        document.page_count
                    );
                }
                geometry
            }
            Err(e) => {
                warn!("geometry batch failed ({e}), using estimated sizes");
                let scale = self.zoom.scale().unwrap_or(1.0);
                vec![
                    PageGeometry::new(
                        document.base_page_width * scale,
                        self.config.default_page_height,
                    );
                    document.page_count
                ]
            }
        };

        let heights = geometry.iter().map(|page| page.height).collect();
        self.virtualizer.measure(heights);
        let widest = geometry.iter().map(|page| page.width).fold(0.0_f32, f32::max);
        self.virtualizer
            .set_content_width(widest + self.config.extra_page_width);
        self.virtualizer.set_enabled(true);
        self.geometry = Some(geometry);
        self.readiness = Readiness::Ready;

        // Consume the anchor exactly once, whether or not restoration lands.
        if let Some(anchor) = self.pending_anchor.take() {
            if let Some(geometry) = &self.geometry {
                self.anchors
                    .restore(&anchor, &mut self.virtualizer, geometry, now);
            }
        }

        vec![Effect::ApiChanged]
    }

    /// Advance time-driven state: zoom debounce, scroll animation, velocity
    pub fn tick(&mut self, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();

        match self.zoom.poll(now) {
            Some(ZoomSettled::Changed(scale)) if self.document.is_some() => {
                self.readiness = Readiness::Computing;
                let request = self.request_geometry(scale);
                effects.push(request);
                effects.push(Effect::ApiChanged);
            }
            Some(_) => {
                // Settled without a scale transition: no batch will run, so
                // the captured anchor has nothing left to wait for.
                self.pending_anchor = None;
            }
            None => {}
        }

        self.virtualizer.tick(now);

        let reference = self
            .virtualizer
            .size_of(0)
            .unwrap_or(self.config.default_page_height);
        self.velocity
            .sample(self.virtualizer.scroll_top(), reference, now);

        effects
    }

    // ---- command surface -------------------------------------------------

    /// Scroll so page `index` is positioned per `align`
    pub fn jump_to_page(&mut self, index: usize, align: Align, behavior: ScrollBehavior, now: Instant) {
        self.virtualizer.scroll_to_index(index, align, behavior, now);
    }

    /// Smooth-scroll to an absolute pixel offset
    pub fn jump_to_offset(&mut self, offset: f32, now: Instant) {
        self.virtualizer
            .scroll_to_offset(offset, Align::Start, ScrollBehavior::Smooth, now);
    }

    /// Smooth-scroll so a highlight's top edge lands at the viewport top
    ///
    /// The fixed pixel margins leave a sliver of context above the highlight.
    pub fn jump_to_highlight_area(&mut self, area: &HighlightArea, now: Instant) {
        let Some(start) = self.virtualizer.offset_for_index(area.page_index) else {
            debug!("highlight jump to missing page {}, ignored", area.page_index);
            return;
        };
        let Some(size) = self.virtualizer.size_of(area.page_index) else {
            return;
        };
        let target = offset_for_highlight(
            area.top,
            size - self.config.highlight_height_margin,
            start - self.config.highlight_offset_margin,
        );
        self.virtualizer
            .scroll_to_offset(target, Align::Start, ScrollBehavior::Smooth, now);
    }

    /// Capture an anchor (at `point` or the viewport center) and step zoom up
    pub fn increase_zoom(&mut self, levels: Option<usize>, point: Option<ViewportPoint>, now: Instant) {
        self.capture_anchor(point);
        self.zoom.increase(levels.unwrap_or(1), now);
    }

    /// Capture an anchor and step zoom down
    pub fn decrease_zoom(&mut self, levels: Option<usize>, point: Option<ViewportPoint>, now: Instant) {
        self.capture_anchor(point);
        self.zoom.decrease(levels.unwrap_or(1), now);
    }

    /// Capture an anchor at the viewport center and apply the fit-width scale
    pub fn zoom_fit_width(&mut self, now: Instant) {
        self.capture_anchor(None);
        self.zoom.fit_width(now);
    }

    /// Resolve a viewport point into `{index, percentage offsets}`
    #[must_use]
    pub fn virtual_item_and_offset_at(&self, point: Option<ViewportPoint>) -> Option<ScrollAnchor> {
        let geometry = self.geometry.as_deref()?;
        self.anchors.capture(&self.virtualizer, geometry, point)
    }

    /// Current scale; `None` before the first document resolves
    #[must_use]
    pub fn scale(&self) -> Option<f32> {
        self.zoom.scale()
    }

    /// Command-surface snapshot for surrounding chrome
    #[must_use]
    pub fn api(&self) -> ReaderApi {
        ReaderApi {
            scale: self.zoom.scale(),
            page_count: self.document.as_ref().map_or(0, |d| d.page_count),
            readiness: self.readiness,
        }
    }

    // ---- host surface ----------------------------------------------------

    /// User scroll input; cancels any running animation
    pub fn set_scroll_offset(&mut self, offset: f32) {
        self.virtualizer.set_scroll_top(offset);
    }

    /// User horizontal scroll input
    pub fn set_horizontal_offset(&mut self, offset: f32) {
        self.virtualizer.set_scroll_left(offset);
    }

    pub fn set_viewport_size(&mut self, width: f32, height: f32) {
        self.virtualizer.set_viewport_size(width, height);
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.virtualizer.viewport()
    }

    #[must_use]
    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    /// A zoom anchor is captured and waiting for new geometry
    #[must_use]
    pub fn is_zooming(&self) -> bool {
        self.pending_anchor.is_some()
    }

    #[must_use]
    pub fn normalized_velocity(&self) -> f32 {
        self.velocity.normalized_velocity()
    }

    /// Total virtualized content height; zero while not enabled
    #[must_use]
    pub fn total_size(&self) -> f32 {
        self.virtualizer.total_size()
    }

    #[must_use]
    pub fn page_geometry(&self, index: usize) -> Option<PageGeometry> {
        self.geometry.as_ref()?.get(index).copied()
    }

    /// Render plan for the current frame: the visible window plus the gate
    /// decision, one entry per live page
    #[must_use]
    pub fn visible_pages(&self) -> Vec<PagePlacement> {
        let decision = gate::decide(
            GateInputs {
                geometry_ready: self.geometry.is_some(),
                zooming: self.is_zooming(),
                normalized_velocity: self.velocity.normalized_velocity(),
            },
            self.config.fast_scroll_velocity,
        );
        let scale = self.zoom.scale().unwrap_or(1.0);
        self.virtualizer
            .visible_items()
            .into_iter()
            .map(|item| {
                let width = self
                    .page_geometry(item.index)
                    .map_or_else(
                        || self.document.as_ref().map_or(0.0, |d| d.base_page_width * scale),
                        |page| page.width,
                    );
                PagePlacement {
                    item,
                    width,
                    decision,
                }
            })
            .collect()
    }

    // ---- internals -------------------------------------------------------

    fn capture_anchor(&mut self, point: Option<ViewportPoint>) {
        let Some(geometry) = self.geometry.as_deref() else {
            return;
        };
        // Keep an already-captured anchor if this one resolves to nothing.
        if let Some(anchor) = self.anchors.capture(&self.virtualizer, geometry, point) {
            self.pending_anchor = Some(anchor);
        }
    }

    fn request_geometry(&mut self, scale: f32) -> Effect {
        let document = self.document.as_ref().map_or(0, |d| d.id);
        self.next_generation += 1;
        let key = GeometryKey::new(document, scale, self.next_generation);
        self.expected_geometry = Some(key);
        debug!("requesting geometry {key:?}");
        Effect::RequestGeometry {
            key,
            scale,
            rotation: self.rotation,
        }
    }

    fn reset_document_state(&mut self) {
        self.virtualizer.clear();
        self.velocity.reset();
        self.geometry = None;
        self.pending_anchor = None;
        self.expected_geometry = None;
        self.readiness = Readiness::NotReady;
    }
}
