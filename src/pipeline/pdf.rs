//! PDF text-layer access behind a scoped session.
//!
//! [`PdfEngine::with_document`] opens the document, hands a [`PageSource`]
//! to the caller's closure and closes everything when the closure returns,
//! whether it succeeded or not. The PDFium handle and the loaded document
//! are plain stack values inside that call, so there is no path on which
//! they outlive extraction.
//!
//! Dropping a `Pdfium` tears down the whole native library, not just the
//! handle, so sessions are serialised: each one binds, loads, reads and
//! unbinds while holding one process-wide lock.
//!
//! ## Why a trait?
//!
//! PDFium is a native library that may be absent on a given host. Keeping
//! the extractor generic over [`PdfEngine`] lets tests feed ordered page
//! text without it.

use crate::error::ExtractionFault;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Environment variable naming an explicit PDFium shared library.
pub const PDFIUM_LIB_ENV: &str = "PDFIUM_LIB_PATH";

/// Held for the full lifetime of every PDFium binding in this process.
static PDFIUM_SESSION: Mutex<()> = Mutex::new(());

/// Run `session` with no other PDFium session alive. A panic in an earlier
/// session leaves no library state behind, so poisoning is ignored.
fn exclusive<T>(session: impl FnOnce() -> T) -> T {
    let _guard = PDFIUM_SESSION
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    session()
}

/// Page-ordered view of an open PDF.
pub trait PageSource {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Plain text of the page at 0-based `index`.
    fn page_text(&self, index: usize) -> Result<String, ExtractionFault>;
}

/// Opens PDFs for text extraction.
pub trait PdfEngine: Send + Sync {
    /// Open `bytes`, run `scope` against the open document, then release it.
    fn with_document(
        &self,
        bytes: &[u8],
        scope: &mut dyn FnMut(&dyn PageSource) -> Result<(), ExtractionFault>,
    ) -> Result<(), ExtractionFault>;
}

/// [`PdfEngine`] backed by Google PDFium.
///
/// Stateless: the library is bound per document because the upstream
/// `Pdfium` type is not `Send`. Binding and unbinding initialise and destroy
/// the library globally, so concurrent documents queue on one session lock.
#[derive(Debug, Clone, Default)]
pub struct PdfiumEngine {
    library_path: Option<PathBuf>,
}

impl PdfiumEngine {
    pub fn new(library_path: Option<PathBuf>) -> Self {
        Self { library_path }
    }

    /// Bind PDFium: explicit path → `PDFIUM_LIB_PATH` → system library.
    fn bind(&self) -> Result<Pdfium, ExtractionFault> {
        let explicit = self
            .library_path
            .clone()
            .or_else(|| std::env::var_os(PDFIUM_LIB_ENV).map(PathBuf::from));

        if let Some(path) = explicit {
            debug!(path = %path.display(), "Binding PDFium from explicit path");
            return bind_from_path(&path);
        }

        Pdfium::bind_to_system_library()
            .map(Pdfium::new)
            .map_err(|e| {
                ExtractionFault::EngineUnavailable(format!(
                    "PDFium library not found. Set {PDFIUM_LIB_ENV} or install PDFium: {e}"
                ))
            })
    }
}

/// Accepts either the library file itself or the directory containing it.
fn bind_from_path(path: &Path) -> Result<Pdfium, ExtractionFault> {
    let lib = if path.is_dir() {
        PathBuf::from(Pdfium::pdfium_platform_library_name_at_path(
            path.to_string_lossy().as_ref(),
        ))
    } else {
        path.to_path_buf()
    };
    Pdfium::bind_to_library(&lib)
        .map(Pdfium::new)
        .map_err(|e| {
            ExtractionFault::EngineUnavailable(format!(
                "Failed to load PDFium from {}: {e}",
                lib.display()
            ))
        })
}

struct PdfiumPages<'d, 'p> {
    document: &'d PdfDocument<'p>,
}

impl PageSource for PdfiumPages<'_, '_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_text(&self, index: usize) -> Result<String, ExtractionFault> {
        let page_index = u16::try_from(index).map_err(|_| ExtractionFault::PdfPage {
            page: index + 1,
            detail: format!("page index {index} exceeds u16 maximum"),
        })?;
        let page = self
            .document
            .pages()
            .get(page_index)
            .map_err(|e| ExtractionFault::PdfPage {
                page: index + 1,
                detail: format!("{e:?}"),
            })?;
        let text = page.text().map_err(|e| ExtractionFault::PdfPage {
            page: index + 1,
            detail: format!("{e:?}"),
        })?;
        Ok(text.all())
    }
}

impl PdfEngine for PdfiumEngine {
    fn with_document(
        &self,
        bytes: &[u8],
        scope: &mut dyn FnMut(&dyn PageSource) -> Result<(), ExtractionFault>,
    ) -> Result<(), ExtractionFault> {
        exclusive(|| -> Result<(), ExtractionFault> {
            let pdfium = self.bind()?;
            let document = pdfium
                .load_pdf_from_byte_slice(bytes, None)
                .map_err(|e| ExtractionFault::PdfOpen(format!("{e:?}")))?;

            let pages = PdfiumPages {
                document: &document,
            };
            let result = scope(&pages);
            debug!("Closing PDF session");
            drop(document);
            drop(pdfium);
            result
        })
    }
}
