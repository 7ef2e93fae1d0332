//! Admission checks that run before any expensive work.
//!
//! [`validate_document`] gates uploaded files by size and declared type;
//! [`normalize_text`] gates pasted text by length. Both are pure.

use crate::config::AnalyzerConfig;
use crate::error::ClausewiseError;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_DOC: &str = "application/msword";

/// Admissible document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    /// Office Open XML word-processing document.
    Docx,
    /// Legacy binary Word document. Admitted, then read as DOCX.
    Doc,
}

impl DocumentKind {
    /// Map a declared mime type to a kind; `None` for anything else.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            MIME_PDF => Some(DocumentKind::Pdf),
            MIME_DOCX => Some(DocumentKind::Docx),
            MIME_DOC => Some(DocumentKind::Doc),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => MIME_PDF,
            DocumentKind::Docx => MIME_DOCX,
            DocumentKind::Doc => MIME_DOC,
        }
    }
}

/// An uploaded document: raw bytes plus the caller's declared mime type.
///
/// Request-scoped; dropped once extraction finishes.
#[derive(Clone)]
pub struct Document {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub name: Option<String>,
}

impl Document {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn kind(&self) -> Option<DocumentKind> {
        DocumentKind::from_mime(&self.mime_type)
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Check size and type admissibility.
///
/// Size is checked first, so an oversized file of the wrong type reports
/// the size problem.
pub fn validate_document(
    doc: &Document,
    config: &AnalyzerConfig,
) -> Result<DocumentKind, ClausewiseError> {
    if doc.size() > config.max_file_bytes {
        return Err(ClausewiseError::FileTooLarge {
            size: doc.size(),
            limit: config.max_file_bytes,
        });
    }
    doc.kind().ok_or_else(|| ClausewiseError::UnsupportedFileType {
        mime: doc.mime_type.clone(),
    })
}

/// Validate pasted text and return it trimmed.
///
/// Lengths are counted in characters. The upper bound applies to the raw
/// input, the lower bound to the trimmed text.
pub fn normalize_text(raw: &str, config: &AnalyzerConfig) -> Result<String, ClausewiseError> {
    let raw_len = raw.chars().count();
    if raw_len > config.max_text_chars {
        return Err(ClausewiseError::TextTooLong {
            len: raw_len,
            max: config.max_text_chars,
        });
    }

    let trimmed = raw.trim();
    let trimmed_len = trimmed.chars().count();
    if trimmed_len < config.min_text_chars {
        return Err(ClausewiseError::TextTooShort {
            len: trimmed_len,
            min: config.min_text_chars,
        });
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> AnalyzerConfig {
        AnalyzerConfig::default()
    }

    #[test]
    fn accepts_pdf_docx_and_doc() {
        for mime in [MIME_PDF, MIME_DOCX, MIME_DOC] {
            let doc = Document::new(vec![0; 16], mime);
            assert!(validate_document(&doc, &cfg()).is_ok(), "{mime}");
        }
    }

    #[test]
    fn rejects_other_types() {
        let doc = Document::new(b"hello".to_vec(), "text/plain");
        let err = validate_document(&doc, &cfg()).unwrap_err();
        assert_eq!(err.to_string(), "Please upload a PDF or DOCX file");
    }

    #[test]
    fn rejects_oversized_file() {
        let doc = Document::new(vec![0; 10 * 1024 * 1024 + 1], MIME_PDF);
        let err = validate_document(&doc, &cfg()).unwrap_err();
        assert_eq!(err.to_string(), "File size must be under 10MB");
    }

    #[test]
    fn exactly_ten_megabytes_is_allowed() {
        let doc = Document::new(vec![0; 10 * 1024 * 1024], MIME_PDF);
        assert_eq!(validate_document(&doc, &cfg()).unwrap(), DocumentKind::Pdf);
    }

    #[test]
    fn oversized_wrong_type_reports_size() {
        let doc = Document::new(vec![0; 11 * 1024 * 1024], "image/png");
        assert!(matches!(
            validate_document(&doc, &cfg()),
            Err(ClausewiseError::FileTooLarge { .. })
        ));
    }

    #[test]
    fn normalizer_trims_valid_text() {
        let body = "x".repeat(60);
        let raw = format!("   {body}\n\n");
        assert_eq!(normalize_text(&raw, &cfg()).unwrap(), body);
    }

    #[test]
    fn normalizer_rejects_short_text_after_trim() {
        let raw = format!("{}{}", " ".repeat(100), "y".repeat(49));
        let err = normalize_text(&raw, &cfg()).unwrap_err();
        assert!(err.to_string().starts_with("Text too short"));
    }

    #[test]
    fn normalizer_boundaries() {
        assert!(normalize_text(&"a".repeat(50), &cfg()).is_ok());
        assert!(normalize_text(&"a".repeat(50_000), &cfg()).is_ok());
        let err = normalize_text(&"a".repeat(50_001), &cfg()).unwrap_err();
        assert!(err.to_string().starts_with("Text too long"));
    }

    #[test]
    fn raw_length_counts_surrounding_whitespace() {
        let raw = format!("{}{}", "a".repeat(49_990), " ".repeat(20));
        assert!(matches!(
            normalize_text(&raw, &cfg()),
            Err(ClausewiseError::TextTooLong { .. })
        ));
    }

    #[test]
    fn mime_matching_is_case_insensitive() {
        assert_eq!(
            DocumentKind::from_mime("Application/PDF"),
            Some(DocumentKind::Pdf)
        );
    }
}
