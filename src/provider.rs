//! Document provider and page renderer contracts
//!
//! The engine never decodes documents or rasterizes pages itself; both jobs
//! belong to collaborators behind these traits. Provider setup is an explicit
//! value handed to the implementation's constructor, never process-global
//! state.
//!
//! `SyntheticProvider` is a deterministic in-memory implementation used by the
//! demo binary and the integration tests.

use crate::error::{GeometryError, LoadError};
use crate::geometry::PageGeometry;

/// Opens document sources
///
/// Implementations typically wrap a decoding library and run on the geometry
/// service's worker thread, hence `Send`.
pub trait DocumentProvider: Send {
    fn open(&mut self, source: &str) -> Result<Box<dyn Document>, LoadError>;
}

/// An open document with a known page count
pub trait Document: Send {
    fn page_count(&self) -> usize;

    /// Fetch a page by 1-based number
    fn page(&self, number: usize) -> Result<Box<dyn Page + '_>, GeometryError>;
}

/// A resolved page whose size can be queried at any scale
pub trait Page {
    /// Page size at `scale`; `rotation` is in degrees, quarter turns swap
    /// the axes
    fn viewport(&self, scale: f32, rotation: i32) -> PageGeometry;
}

/// Produces visual content for one page
///
/// Invoked once per visible, render-gated index; hosts pair it with
/// [`crate::cache::RenderCache`] to keep "once" cheap across frames.
pub trait PageRenderer {
    type Output;

    fn render_page(&mut self, scale: f32, page_index: usize, rotate: i32) -> Self::Output;
}

impl<F, T> PageRenderer for F
where
    F: FnMut(f32, usize, i32) -> T,
{
    type Output = T;

    fn render_page(&mut self, scale: f32, page_index: usize, rotate: i32) -> T {
        self(scale, page_index, rotate)
    }
}

/// Base (scale 1) page sizes for a synthetic document
#[derive(Clone, Debug)]
pub struct SyntheticDocumentSpec {
    pub base_sizes: Vec<PageGeometry>,
    pub title: Option<String>,
}

impl SyntheticDocumentSpec {
    /// A document of `count` identical pages
    #[must_use]
    pub fn uniform(count: usize, width: f32, height: f32) -> Self {
        Self {
            base_sizes: vec![PageGeometry::new(width, height); count],
            title: None,
        }
    }
}

/// In-memory provider serving synthetic documents by name
#[derive(Debug, Default)]
pub struct SyntheticProvider {
    documents: Vec<(String, SyntheticDocumentSpec)>,
}

impl SyntheticProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, spec: SyntheticDocumentSpec) {
        self.documents.push((name.into(), spec));
    }
}

impl DocumentProvider for SyntheticProvider {
    fn open(&mut self, source: &str) -> Result<Box<dyn Document>, LoadError> {
        let spec = self
            .documents
            .iter()
            .find(|(name, _)| name == source)
            .map(|(_, spec)| spec.clone())
            .ok_or_else(|| LoadError::NotFound {
                path: source.to_string(),
            })?;
        Ok(Box::new(SyntheticDocument { spec }))
    }
}

struct SyntheticDocument {
    spec: SyntheticDocumentSpec,
}

impl Document for SyntheticDocument {
    fn page_count(&self) -> usize {
        self.spec.base_sizes.len()
    }

    fn page(&self, number: usize) -> Result<Box<dyn Page + '_>, GeometryError> {
        let index = number.checked_sub(1).ok_or(GeometryError::OutOfRange {
            page: number,
            count: self.page_count(),
        })?;
        let base = *self
            .spec
            .base_sizes
            .get(index)
            .ok_or(GeometryError::OutOfRange {
                page: number,
                count: self.page_count(),
            })?;
        Ok(Box::new(SyntheticPage { base }))
    }
}

struct SyntheticPage {
    base: PageGeometry,
}

impl Page for SyntheticPage {
    fn viewport(&self, scale: f32, rotation: i32) -> PageGeometry {
        let width = self.base.width * scale;
        let height = self.base.height * scale;
        if rotation.rem_euclid(180) == 90 {
            PageGeometry::new(height, width)
        } else {
            PageGeometry::new(width, height)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> SyntheticProvider {
        let mut p = SyntheticProvider::new();
        p.insert("book", SyntheticDocumentSpec::uniform(10, 600.0, 800.0));
        p
    }

    #[test]
    fn open_unknown_source_fails() {
        let mut p = provider();
        assert!(matches!(
            p.open("missing"),
            Err(LoadError::NotFound { .. })
        ));
    }

    #[test]
    fn pages_scale_linearly() {
        let mut p = provider();
        let doc = p.open("book").unwrap();
        assert_eq!(doc.page_count(), 10);

        let page = doc.page(1).unwrap();
        assert_eq!(page.viewport(1.0, 0), PageGeometry::new(600.0, 800.0));
        assert_eq!(page.viewport(2.0, 0), PageGeometry::new(1200.0, 1600.0));
    }

    #[test]
    fn quarter_turn_swaps_axes() {
        let mut p = provider();
        let doc = p.open("book").unwrap();
        let page = doc.page(1).unwrap();
        assert_eq!(page.viewport(1.0, 90), PageGeometry::new(800.0, 600.0));
        assert_eq!(page.viewport(1.0, 270), PageGeometry::new(800.0, 600.0));
        assert_eq!(page.viewport(1.0, 180), PageGeometry::new(600.0, 800.0));
    }

    #[test]
    fn page_numbers_are_one_based() {
        let mut p = provider();
        let doc = p.open("book").unwrap();
        assert!(doc.page(0).is_err());
        assert!(doc.page(10).is_ok());
        assert!(doc.page(11).is_err());
    }

    #[test]
    fn closures_implement_page_renderer() {
        let mut renderer = |scale: f32, page_index: usize, _rotate: i32| {
            format!("page {page_index} @ {scale}")
        };
        assert_eq!(renderer.render_page(1.5, 3, 0), "page 3 @ 1.5");
    }
}
