//! Text extractor: binary document → plain text, with progress.
//!
//! ## Stages
//!
//! ```text
//! validating (0) ──▶ extracting (10 … 80) ──▶ [ocr (80 … 95)] ──▶ complete (100)
//! ```
//!
//! * **PDF**: page text is read strictly in page order inside one scoped
//!   [`PdfEngine`] session; progress moves `30 + i/N·50` per page. If the
//!   trimmed result is shorter than `ocr_threshold_chars` the document is
//!   treated as image-based and handed to the [`OcrBackend`].
//! * **DOCX / DOC**: single pass over the body XML; empty text is a fault.
//!
//! Validation failures surface as-is. Every other failure is logged with its
//! detail and reported as [`ClausewiseError::ExtractionFailed`].

use crate::config::AnalyzerConfig;
use crate::document::{validate_document, Document, DocumentKind};
use crate::error::{ClausewiseError, ExtractionFault};
use crate::pipeline::docx::{extract_docx_text, XML_BYTES_PER_TEXT_CHAR};
use crate::pipeline::ocr::{OcrBackend, SentinelOcr, OCR_SENTINEL_TEXT};
use crate::pipeline::pdf::{PdfEngine, PdfiumEngine};
use crate::progress::{
    ExtractionProgressCallback, ExtractionStage, ProgressCallback, ProgressReporter,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Where the extracted text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextSource {
    /// Native PDF text layer.
    PdfTextLayer,
    /// DOCX body XML.
    Docx,
    /// OCR branch; `sentinel` is true when no recognition was performed.
    Ocr { backend: String, sentinel: bool },
}

/// Successfully extracted text. `text` is trimmed and never empty.
#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub text: String,
    pub source: TextSource,
    /// PDF page count; None for Word documents.
    pub page_count: Option<usize>,
}

impl ExtractedText {
    /// True when the text is a placeholder explaining that OCR was needed.
    pub fn ocr_required(&self) -> bool {
        matches!(self.source, TextSource::Ocr { sentinel: true, .. })
    }
}

/// Turns [`Document`]s into text.
///
/// Cheap to clone; the engines are shared.
#[derive(Clone)]
pub struct TextExtractor {
    config: AnalyzerConfig,
    pdf: Arc<dyn PdfEngine>,
    ocr: Arc<dyn OcrBackend>,
}

impl TextExtractor {
    /// PDFium for PDFs, the sentinel OCR backend for image-based PDFs.
    pub fn new(config: AnalyzerConfig) -> Self {
        let pdf = Arc::new(PdfiumEngine::new(config.pdfium_library_path.clone()));
        Self::with_engines(config, pdf, Arc::new(SentinelOcr))
    }

    pub fn with_engines(
        config: AnalyzerConfig,
        pdf: Arc<dyn PdfEngine>,
        ocr: Arc<dyn OcrBackend>,
    ) -> Self {
        Self { config, pdf, ocr }
    }

    /// Extract on a blocking worker thread, bounded by
    /// `extraction_timeout_secs`.
    ///
    /// On timeout the worker is detached; it still releases its PDF session
    /// when it finishes, but its result is discarded and it stops reporting
    /// progress.
    pub async fn extract(
        &self,
        doc: Document,
        progress: Option<ProgressCallback>,
    ) -> Result<ExtractedText, ClausewiseError> {
        let secs = self.config.extraction_timeout_secs;
        let cancelled = Arc::new(AtomicBool::new(false));
        let this = self.clone();
        let flag = Arc::clone(&cancelled);
        let worker = tokio::task::spawn_blocking(move || {
            let reporter = ProgressReporter::new(progress.as_deref()).cancellable(&flag);
            this.run(&doc, &reporter)
        });

        match tokio::time::timeout(Duration::from_secs(secs), worker).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(fail(ExtractionFault::Worker(join_err.to_string()))),
            Err(_) => {
                cancelled.store(true, Ordering::Release);
                Err(fail(ExtractionFault::TimedOut { secs }))
            }
        }
    }

    /// Synchronous extraction. Runs on the calling thread.
    pub fn extract_blocking(
        &self,
        doc: &Document,
        progress: Option<&dyn ExtractionProgressCallback>,
    ) -> Result<ExtractedText, ClausewiseError> {
        self.run(doc, &ProgressReporter::new(progress))
    }

    fn run(
        &self,
        doc: &Document,
        reporter: &ProgressReporter<'_>,
    ) -> Result<ExtractedText, ClausewiseError> {
        let start = Instant::now();

        reporter.report(ExtractionStage::Validating, 0.0, "Validating document...");
        let kind = validate_document(doc, &self.config)?;

        reporter.report(ExtractionStage::Extracting, 10.0, "Reading document...");
        let result = match kind {
            DocumentKind::Pdf => self.extract_pdf(&doc.bytes, reporter),
            DocumentKind::Docx | DocumentKind::Doc => self.extract_docx(&doc.bytes, reporter),
        };

        match result {
            Ok(extracted) => {
                reporter.report(ExtractionStage::Complete, 100.0, "Text extraction complete!");
                info!(
                    "Extracted {} chars from {:?} ({:?}) in {}ms",
                    extracted.text.chars().count(),
                    doc.name.as_deref().unwrap_or("<upload>"),
                    extracted.source,
                    start.elapsed().as_millis()
                );
                Ok(extracted)
            }
            Err(fault) => Err(fail(fault)),
        }
    }

    fn extract_pdf(
        &self,
        bytes: &[u8],
        reporter: &ProgressReporter<'_>,
    ) -> Result<ExtractedText, ExtractionFault> {
        let mut full_text = String::new();
        let mut total_pages = 0usize;

        self.pdf.with_document(bytes, &mut |pages| {
            total_pages = pages.page_count();
            reporter.report(
                ExtractionStage::Extracting,
                30.0,
                format!("Processing {total_pages} pages..."),
            );

            for i in 0..total_pages {
                let page_text = pages.page_text(i)?;
                debug!("Page {}: {} chars", i + 1, page_text.len());
                full_text.push_str(&page_text);
                full_text.push('\n');

                let done = i + 1;
                reporter.report(
                    ExtractionStage::Extracting,
                    30.0 + (done as f32 / total_pages as f32) * 50.0,
                    format!("Processing page {done} of {total_pages}..."),
                );
            }
            Ok(())
        })?;

        let trimmed = full_text.trim();
        if trimmed.chars().count() < self.config.ocr_threshold_chars {
            info!(
                "PDF text layer has {} chars across {} pages; treating as image-based",
                trimmed.chars().count(),
                total_pages
            );
            return self.extract_ocr(bytes, total_pages, reporter);
        }

        Ok(ExtractedText {
            text: trimmed.to_string(),
            source: TextSource::PdfTextLayer,
            page_count: Some(total_pages),
        })
    }

    fn extract_ocr(
        &self,
        bytes: &[u8],
        total_pages: usize,
        reporter: &ProgressReporter<'_>,
    ) -> Result<ExtractedText, ExtractionFault> {
        reporter.report(
            ExtractionStage::Ocr,
            80.0,
            "Document appears to be image-based, using OCR...",
        );
        reporter.report(ExtractionStage::Ocr, 85.0, "Performing OCR on document...");

        let recognized = self.ocr.recognize(bytes)?;
        let trimmed = recognized.trim();
        let (text, sentinel) = if trimmed.is_empty() {
            (OCR_SENTINEL_TEXT.to_string(), true)
        } else {
            (
                trimmed.to_string(),
                crate::pipeline::ocr::is_ocr_sentinel(trimmed),
            )
        };

        reporter.report(ExtractionStage::Ocr, 95.0, "OCR stage finished");
        Ok(ExtractedText {
            text,
            source: TextSource::Ocr {
                backend: self.ocr.name().to_string(),
                sentinel,
            },
            page_count: Some(total_pages),
        })
    }

    fn extract_docx(
        &self,
        bytes: &[u8],
        reporter: &ProgressReporter<'_>,
    ) -> Result<ExtractedText, ExtractionFault> {
        reporter.report(
            ExtractionStage::Extracting,
            50.0,
            "Extracting text from Word document...",
        );
        let max_xml_bytes =
            (self.config.max_text_chars as u64).saturating_mul(XML_BYTES_PER_TEXT_CHAR);
        let raw = extract_docx_text(bytes, max_xml_bytes)?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ExtractionFault::NoText);
        }
        Ok(ExtractedText {
            text: trimmed.to_string(),
            source: TextSource::Docx,
            page_count: None,
        })
    }
}

/// Log the detail, hand back the generic error.
fn fail(fault: ExtractionFault) -> ClausewiseError {
    error!("Document extraction failed: {fault}");
    ClausewiseError::ExtractionFailed
}
