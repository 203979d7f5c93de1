//! Error taxonomy for document loading and geometry computation
//!
//! Both errors are recoverable by policy: a `LoadError` resets the reader to
//! an empty view, a `GeometryError` fails the whole batch and the reader
//! falls back to estimated page sizes. Nothing here is fatal to the host.

/// Document failed to open
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("document not found: {path}")]
    NotFound { path: String },

    #[error("document engine: {detail}")]
    Engine { detail: String },
}

impl LoadError {
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine { detail: msg.into() }
    }
}

/// A per-page size query failed during a geometry batch
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    #[error("page {page} size query failed: {detail}")]
    Page { page: usize, detail: String },

    #[error("page {page} out of range (document has {count} pages)")]
    OutOfRange { page: usize, count: usize },
}

impl GeometryError {
    pub fn page(page: usize, msg: impl Into<String>) -> Self {
        Self::Page {
            page,
            detail: msg.into(),
        }
    }
}
