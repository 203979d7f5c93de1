//! Geometry service - worker thread owning the open document
//!
//! Document opening and per-page size queries are the engine's only slow
//! operations, so they run on a dedicated worker fed by flume channels; the
//! orchestrator stays single-threaded and lock-free. Every geometry batch is
//! tagged with a [`GeometryKey`] and computed as a unit - partial results
//! never escape the worker. The orchestrator discards completions whose key
//! no longer matches its state; the worker itself never cancels mid-batch.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use flume::{Receiver, Sender};
use log::{debug, error, info};

use crate::error::{GeometryError, LoadError};
use crate::geometry::PageGeometry;
use crate::provider::{Document, DocumentProvider};

/// Generation tag for a geometry batch
///
/// Scale is stored in millionths so the key is `Eq`/`Hash`-able; a completion
/// is applied only when the whole key still matches the orchestrator's
/// current `(document, scale, generation)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GeometryKey {
    /// Document identity (assigned per successful open)
    pub document: u64,
    /// Scale factor in millionths
    pub scale_millionths: u32,
    /// Monotonic request generation
    pub generation: u64,
}

impl GeometryKey {
    #[must_use]
    pub fn new(document: u64, scale: f32, generation: u64) -> Self {
        Self {
            document,
            scale_millionths: (scale * 1_000_000.0) as u32,
            generation,
        }
    }
}

/// Document metadata delivered on a successful open
#[derive(Clone, Debug)]
pub struct DocumentInfo {
    pub page_count: usize,
    pub title: Option<String>,
    /// First page width at scale 1, used for the fit-to-width computation
    pub base_page_width: f32,
}

/// Request sent to the geometry worker
#[derive(Debug)]
pub enum ServiceRequest {
    /// Open a document source, replacing any currently open document
    Open { source: String },

    /// Compute the full per-page size batch at `scale`
    Geometry {
        key: GeometryKey,
        scale: f32,
        rotation: i32,
    },

    /// Stop the worker
    Shutdown,
}

/// Response from the geometry worker
#[derive(Debug)]
pub enum ServiceResponse {
    Opened { document: u64, info: DocumentInfo },

    OpenFailed { source: String, error: LoadError },

    Geometry {
        key: GeometryKey,
        result: Result<Vec<PageGeometry>, GeometryError>,
    },
}

/// Handle to the geometry worker thread
///
/// Sends `Shutdown` and joins the worker on drop, so the thread cannot
/// outlive its owner on any exit path.
pub struct GeometryService {
    request_tx: Sender<ServiceRequest>,
    response_rx: Receiver<ServiceResponse>,
    worker: Option<JoinHandle<()>>,
}

impl GeometryService {
    /// Spawn the worker with the provider it will own
    #[must_use]
    pub fn spawn(provider: Box<dyn DocumentProvider>) -> Self {
        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();
        let worker = thread::Builder::new()
            .name("vellum-geometry".into())
            .spawn(move || geometry_worker(provider, &request_rx, &response_tx));
        match worker {
            Ok(handle) => Self {
                request_tx,
                response_rx,
                worker: Some(handle),
            },
            Err(e) => {
                // Spawn failure leaves a service whose channels are dead;
                // requests become no-ops and the host sees no responses.
                error!("failed to spawn geometry worker: {e}");
                Self {
                    request_tx,
                    response_rx,
                    worker: None,
                }
            }
        }
    }

    pub fn open(&self, source: impl Into<String>) {
        let _ = self.request_tx.send(ServiceRequest::Open {
            source: source.into(),
        });
    }

    pub fn request_geometry(&self, key: GeometryKey, scale: f32, rotation: i32) {
        let _ = self.request_tx.send(ServiceRequest::Geometry {
            key,
            scale,
            rotation,
        });
    }

    /// Non-blocking poll for the next completion
    #[must_use]
    pub fn try_recv(&self) -> Option<ServiceResponse> {
        self.response_rx.try_recv().ok()
    }

    /// Blocking poll with a deadline, for hosts without a frame loop
    #[must_use]
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ServiceResponse> {
        self.response_rx.recv_timeout(timeout).ok()
    }
}

impl Drop for GeometryService {
    fn drop(&mut self) {
        let _ = self.request_tx.send(ServiceRequest::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn geometry_worker(
    mut provider: Box<dyn DocumentProvider>,
    request_rx: &Receiver<ServiceRequest>,
    response_tx: &Sender<ServiceResponse>,
) {
    let mut open_document: Option<(u64, Box<dyn Document>)> = None;
    let mut next_document_id: u64 = 1;

    while let Ok(request) = request_rx.recv() {
        match request {
            ServiceRequest::Open { source } => {
                let response = match open_info(provider.as_mut(), &source) {
                    Ok((document, info)) => {
                        let id = next_document_id;
                        next_document_id += 1;
                        info!(
                            "opened '{source}': {} pages, base width {:.0}px",
                            info.page_count, info.base_page_width
                        );
                        open_document = Some((id, document));
                        ServiceResponse::Opened { document: id, info }
                    }
                    Err(error) => {
                        error!("open '{source}' failed: {error}");
                        open_document = None;
                        ServiceResponse::OpenFailed { source, error }
                    }
                };
                if response_tx.send(response).is_err() {
                    break;
                }
            }

            ServiceRequest::Geometry {
                key,
                scale,
                rotation,
            } => {
                let Some((id, document)) = &open_document else {
                    debug!("geometry request {key:?} with no open document, dropped");
                    continue;
                };
                if *id != key.document {
                    debug!("geometry request {key:?} for replaced document, dropped");
                    continue;
                }
                let result = compute_batch(document.as_ref(), scale, rotation);
                if response_tx
                    .send(ServiceResponse::Geometry { key, result })
                    .is_err()
                {
                    break;
                }
            }

            ServiceRequest::Shutdown => break,
        }
    }
}

fn open_info(
    provider: &mut dyn DocumentProvider,
    source: &str,
) -> Result<(Box<dyn Document>, DocumentInfo), LoadError> {
    let document = provider.open(source)?;
    let page_count = document.page_count();
    if page_count == 0 {
        return Err(LoadError::engine("document has no pages"));
    }
    let base_page_width = document
        .page(1)
        .map_err(|e| LoadError::engine(e.to_string()))?
        .viewport(1.0, 0)
        .width;
    let info = DocumentInfo {
        page_count,
        title: None,
        base_page_width,
    };
    Ok((document, info))
}

/// Query every page size; the batch fails as a whole on the first error
fn compute_batch(
    document: &dyn Document,
    scale: f32,
    rotation: i32,
) -> Result<Vec<PageGeometry>, GeometryError> {
    let mut sizes = Vec::with_capacity(document.page_count());
    for number in 1..=document.page_count() {
        let page = document.page(number)?;
        sizes.push(page.viewport(scale, rotation));
    }
    Ok(sizes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{Page, SyntheticDocumentSpec, SyntheticProvider};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn service() -> GeometryService {
        let mut provider = SyntheticProvider::new();
        provider.insert("book", SyntheticDocumentSpec::uniform(10, 600.0, 800.0));
        GeometryService::spawn(Box::new(provider))
    }

    #[test]
    fn open_reports_document_info() {
        let service = service();
        service.open("book");
        match service.recv_timeout(TIMEOUT) {
            Some(ServiceResponse::Opened { document, info }) => {
                assert_eq!(document, 1);
                assert_eq!(info.page_count, 10);
                assert_eq!(info.base_page_width, 600.0);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn open_failure_is_reported() {
        let service = service();
        service.open("missing");
        match service.recv_timeout(TIMEOUT) {
            Some(ServiceResponse::OpenFailed { source, .. }) => assert_eq!(source, "missing"),
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn geometry_batch_scales_every_page() {
        let service = service();
        service.open("book");
        let document = match service.recv_timeout(TIMEOUT) {
            Some(ServiceResponse::Opened { document, .. }) => document,
            other => panic!("unexpected response: {other:?}"),
        };

        let key = GeometryKey::new(document, 2.0, 1);
        service.request_geometry(key, 2.0, 0);
        match service.recv_timeout(TIMEOUT) {
            Some(ServiceResponse::Geometry {
                key: reply,
                result: Ok(sizes),
            }) => {
                assert_eq!(reply, key);
                assert_eq!(sizes.len(), 10);
                assert_eq!(sizes[0], PageGeometry::new(1200.0, 1600.0));
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn geometry_for_replaced_document_is_dropped() {
        let service = service();
        service.open("book");
        let first = match service.recv_timeout(TIMEOUT) {
            Some(ServiceResponse::Opened { document, .. }) => document,
            other => panic!("unexpected response: {other:?}"),
        };

        // Reopen; the old document id is now stale.
        service.open("book");
        let second = match service.recv_timeout(TIMEOUT) {
            Some(ServiceResponse::Opened { document, .. }) => document,
            other => panic!("unexpected response: {other:?}"),
        };
        assert_ne!(first, second);

        service.request_geometry(GeometryKey::new(first, 1.0, 1), 1.0, 0);
        service.request_geometry(GeometryKey::new(second, 1.0, 2), 1.0, 0);

        // Only the request for the live document answers.
        match service.recv_timeout(TIMEOUT) {
            Some(ServiceResponse::Geometry { key, .. }) => assert_eq!(key.document, second),
            other => panic!("unexpected response: {other:?}"),
        }
    }

    struct BrokenPages;

    impl DocumentProvider for BrokenPages {
        fn open(&mut self, _source: &str) -> Result<Box<dyn Document>, LoadError> {
            Ok(Box::new(BrokenDocument))
        }
    }

    struct BrokenDocument;

    impl Document for BrokenDocument {
        fn page_count(&self) -> usize {
            3
        }

        fn page(&self, number: usize) -> Result<Box<dyn Page + '_>, GeometryError> {
            if number == 1 {
                Ok(Box::new(FixedPage))
            } else {
                Err(GeometryError::page(number, "corrupt page tree"))
            }
        }
    }

    struct FixedPage;

    impl Page for FixedPage {
        fn viewport(&self, scale: f32, _rotation: i32) -> PageGeometry {
            PageGeometry::new(600.0 * scale, 800.0 * scale)
        }
    }

    #[test]
    fn one_bad_page_fails_the_whole_batch() {
        let service = GeometryService::spawn(Box::new(BrokenPages));
        service.open("anything");
        let document = match service.recv_timeout(TIMEOUT) {
            Some(ServiceResponse::Opened { document, .. }) => document,
            other => panic!("unexpected response: {other:?}"),
        };

        service.request_geometry(GeometryKey::new(document, 1.0, 1), 1.0, 0);
        match service.recv_timeout(TIMEOUT) {
            Some(ServiceResponse::Geometry {
                result: Err(GeometryError::Page { page, .. }),
                ..
            }) => assert_eq!(page, 2),
            other => panic!("unexpected response: {other:?}"),
        }
    }
}
