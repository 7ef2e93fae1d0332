//! Error types for the clausewise library.
//!
//! Three error types reflect three distinct failure modes:
//!
//! * [`ClausewiseError`]: **Fatal for the request**: bad input, unreadable
//!   document, misconfiguration. Returned as `Err(ClausewiseError)` and
//!   surfaced to the caller with a user-actionable message.
//!
//! * [`ExtractionFault`]: **Internal detail** of why a document could not be
//!   read. It is logged and then collapsed into
//!   [`ClausewiseError::ExtractionFailed`] so parser internals never leak
//!   to end users.
//!
//! * [`AnalysisFault`]: **Absorbed**: the model call failed, timed out, or
//!   returned something that is not an Analysis. Every fault of this kind is
//!   replaced by a fallback analysis; none of them ever reaches the caller.

use thiserror::Error;

/// Generic user-facing message for any document that could not be read.
pub const EXTRACTION_FAILED_MESSAGE: &str =
    "Failed to extract text from document. Please try another file.";

/// All request-fatal errors returned by the clausewise library.
#[derive(Debug, Error)]
pub enum ClausewiseError {
    // ── Validation errors ─────────────────────────────────────────────────
    /// Uploaded file exceeds the size cap.
    #[error("File size must be under 10MB")]
    FileTooLarge { size: u64, limit: u64 },

    /// Declared mime type is not PDF, DOCX or legacy DOC.
    #[error("Please upload a PDF or DOCX file")]
    UnsupportedFileType { mime: String },

    /// `text` missing or blank on the analyze endpoint.
    #[error("Text is required")]
    TextRequired,

    /// Pasted text shorter than the minimum after trimming.
    #[error("Text too short. Please provide at least {min} characters.")]
    TextTooShort { len: usize, min: usize },

    /// Pasted, submitted or extracted text longer than the maximum.
    #[error("Text too long. Maximum {} characters allowed.", group_thousands(*.max))]
    TextTooLong { len: usize, max: usize },

    /// Save request without an email or without an analysis.
    #[error("Email and analysis are required")]
    SaveFieldsRequired,

    /// Save request whose email does not look like an address.
    #[error("Invalid email format")]
    InvalidEmail,

    /// Save request whose analysis does not have the Analysis shape.
    #[error("Invalid analysis structure")]
    InvalidAnalysis { detail: String },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The document could not be read. Detail is logged, never shown.
    #[error("{}", EXTRACTION_FAILED_MESSAGE)]
    ExtractionFailed,

    // ── Processing errors ─────────────────────────────────────────────────
    /// A processing stage was entered out of order.
    #[error("Cannot move from stage '{from}' to '{to}'")]
    InvalidTransition { from: String, to: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Input file could not be read or downloaded.
    #[error("Failed to load '{input}': {reason}")]
    InputUnavailable { input: String, reason: String },

    /// The save collaborator rejected the record.
    #[error("Failed to save analysis: {0}")]
    Storage(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClausewiseError {
    /// True for errors caused by the caller's input (HTTP 400 class).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ClausewiseError::FileTooLarge { .. }
                | ClausewiseError::UnsupportedFileType { .. }
                | ClausewiseError::TextRequired
                | ClausewiseError::TextTooShort { .. }
                | ClausewiseError::TextTooLong { .. }
                | ClausewiseError::SaveFieldsRequired
                | ClausewiseError::InvalidEmail
                | ClausewiseError::InvalidAnalysis { .. }
        )
    }
}

/// Why a document could not be read.
///
/// Never shown to end users; see [`ClausewiseError::ExtractionFailed`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExtractionFault {
    /// The PDF engine library could not be loaded.
    #[error("PDF engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The PDF header/xref could not be parsed, or it is encrypted.
    #[error("Unable to open PDF: {0}")]
    PdfOpen(String),

    /// A single page's text layer could not be read.
    #[error("Unable to read text of page {page}: {detail}")]
    PdfPage { page: usize, detail: String },

    /// The DOCX container or its main part is unreadable.
    #[error("Unable to read Word document: {0}")]
    Docx(String),

    /// Direct extraction produced nothing.
    #[error("No text found in document")]
    NoText,

    /// Mime type admitted by the validator but without an extractor.
    #[error("Unsupported file type '{0}'")]
    Unsupported(String),

    /// OCR backend failed.
    #[error("Unable to process image-based document: {0}")]
    Ocr(String),

    /// Extraction exceeded the configured time budget.
    #[error("Extraction timed out after {secs}s")]
    TimedOut { secs: u64 },

    /// The blocking extraction worker panicked or was cancelled.
    #[error("Extraction worker failed: {0}")]
    Worker(String),
}

/// Why the model path did not yield an Analysis.
///
/// Always absorbed by the fallback analyzer.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AnalysisFault {
    /// The provider call itself failed (network, auth, quota).
    #[error("Model invocation failed: {0}")]
    ModelInvocation(String),

    /// The provider did not answer within the configured budget.
    #[error("Model call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The response body is not JSON.
    #[error("Model response is not valid JSON: {0}")]
    ResponseParse(String),

    /// The response is JSON but not an Analysis.
    #[error("Invalid analysis structure from model: {0}")]
    StructureInvalid(String),
}

/// Format `n` with `,` thousands separators (`50000` → `50,000`).
pub(crate) fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
