//! OCR branch for image-based PDFs.
//!
//! No OCR engine ships with this crate. The default backend,
//! [`SentinelOcr`], returns a clearly marked explanation instead of text so
//! that downstream code can tell "OCR was needed and not performed" apart
//! from "the document is empty". A real engine can be plugged in through
//! [`OcrBackend`].

use crate::error::ExtractionFault;

/// First line of every OCR sentinel text.
pub const OCR_SENTINEL_MARKER: &str = "[OCR Processing Required]";

/// Full sentinel text returned by [`SentinelOcr`].
pub const OCR_SENTINEL_TEXT: &str = "[OCR Processing Required]

This document appears to be image-based and requires Optical Character Recognition (OCR) to extract text.

Please try uploading a text-based PDF or Word document instead.

Processing of image-based documents will be available in a future update.";

/// True when `text` is (or starts with) the OCR sentinel.
pub fn is_ocr_sentinel(text: &str) -> bool {
    text.trim_start().starts_with(OCR_SENTINEL_MARKER)
}

/// Recognises text in an image-based PDF.
pub trait OcrBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Return the document's text. Must never return an empty string: when
    /// nothing is recognised, return a sentinel starting with
    /// [`OCR_SENTINEL_MARKER`].
    fn recognize(&self, pdf_bytes: &[u8]) -> Result<String, ExtractionFault>;
}

/// Backend that performs no recognition and always returns the sentinel.
#[derive(Debug, Clone, Copy, Default)]
pub struct SentinelOcr;

impl OcrBackend for SentinelOcr {
    fn name(&self) -> &str {
        "sentinel"
    }

    fn recognize(&self, _pdf_bytes: &[u8]) -> Result<String, ExtractionFault> {
        Ok(OCR_SENTINEL_TEXT.to_string())
    }
}
