//! Virtualized, zoom-anchored scroll engine for paginated document viewers
//!
//! Renders long documents inside a scrollable viewport without materializing
//! every page: the virtualizer decides which pages are live, the zoom
//! controller steps a debounced scale, anchors keep the user's visual
//! position stable across zoom changes, and a render gate swaps pages for
//! placeholders during fast flicks. Document decoding and page rasterization
//! stay behind the [`provider`] traits; geometry batches run on the
//! [`service`] worker so the engine itself is single-threaded and lock-free.

pub mod anchor;
pub mod animator;
pub mod cache;
pub mod config;
pub mod error;
pub mod gate;
pub mod geometry;
pub mod provider;
pub mod reader;
pub mod service;
pub mod velocity;
pub mod virtualizer;
pub mod zoom;

pub use anchor::{AnchorResolver, ScrollAnchor, ViewportPoint};
pub use cache::{RenderCache, RenderKey};
pub use config::EngineConfig;
pub use error::{GeometryError, LoadError};
pub use gate::RenderDecision;
pub use geometry::PageGeometry;
pub use provider::{Document, DocumentProvider, Page, PageRenderer};
pub use reader::{Effect, HighlightArea, PagePlacement, Reader, ReaderApi, Readiness};
pub use service::{DocumentInfo, GeometryKey, GeometryService, ServiceResponse};
pub use virtualizer::{Align, ScrollBehavior, VirtualItem, Viewport, Virtualizer};
pub use zoom::{ZOOM_LEVELS, ZoomController, ZoomSettled};
