//! Input loading for the CLI: turn a user-supplied path or URL into a
//! [`Document`].
//!
//! The mime type is decided from the file's magic bytes first and its
//! extension second, so a mislabelled `contract.pdf` that is really a Word
//! file is still routed correctly. Anything unrecognised keeps a generic
//! type and is rejected later by the validator with the usual message.

use crate::document::{Document, MIME_DOC, MIME_DOCX, MIME_PDF};
use crate::error::ClausewiseError;
use std::path::Path;
use tracing::{debug, info};

const MIME_UNKNOWN: &str = "application/octet-stream";

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Load a local file or download a URL.
pub async fn load_document(input: &str, timeout_secs: u64) -> Result<Document, ClausewiseError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        load_local(input).await
    }
}

async fn load_local(path_str: &str) -> Result<Document, ClausewiseError> {
    let path = Path::new(path_str);
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ClausewiseError::InputUnavailable {
            input: path_str.to_string(),
            reason: e.to_string(),
        })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path_str.to_string());
    let mime = detect_mime(&bytes, &name);
    debug!("Loaded {} ({} bytes, {})", path.display(), bytes.len(), mime);
    Ok(Document::new(bytes, mime).with_name(name))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<Document, ClausewiseError> {
    info!("Downloading document from: {}", url);

    let unavailable = |reason: String| ClausewiseError::InputUnavailable {
        input: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| unavailable(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            unavailable(format!("timed out after {timeout_secs}s"))
        } else {
            unavailable(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(unavailable(format!("HTTP {}", response.status())));
    }

    let name = filename_from_url(url);
    let bytes = response
        .bytes()
        .await
        .map_err(|e| unavailable(e.to_string()))?
        .to_vec();

    let mime = detect_mime(&bytes, &name);
    info!("Downloaded {} bytes ({})", bytes.len(), mime);
    Ok(Document::new(bytes, mime).with_name(name))
}

/// Last path segment of the URL when it looks like a file name.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }
    "downloaded".to_string()
}

/// Decide a mime type from magic bytes, then from the file extension.
pub fn detect_mime(bytes: &[u8], name: &str) -> &'static str {
    if bytes.starts_with(b"%PDF") {
        return MIME_PDF;
    }
    if bytes.starts_with(b"PK\x03\x04") {
        return MIME_DOCX;
    }
    if bytes.starts_with(b"\xD0\xCF\x11\xE0") {
        return MIME_DOC;
    }

    let ext = Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => MIME_PDF,
        Some("docx") => MIME_DOCX,
        Some("doc") => MIME_DOC,
        _ => MIME_UNKNOWN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/lease.pdf"));
        assert!(is_url("http://example.com/lease.pdf"));
        assert!(!is_url("/tmp/lease.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn magic_bytes_win_over_extension() {
        assert_eq!(detect_mime(b"%PDF-1.7 ...", "contract.docx"), MIME_PDF);
        assert_eq!(detect_mime(b"PK\x03\x04rest", "contract.pdf"), MIME_DOCX);
        assert_eq!(detect_mime(b"\xD0\xCF\x11\xE0\xA1", "x"), MIME_DOC);
    }

    #[test]
    fn extension_fallback() {
        assert_eq!(detect_mime(b"", "LEASE.PDF"), MIME_PDF);
        assert_eq!(detect_mime(b"", "nda.docx"), MIME_DOCX);
        assert_eq!(detect_mime(b"hello", "notes.txt"), MIME_UNKNOWN);
    }

    #[test]
    fn filename_from_url_path() {
        assert_eq!(filename_from_url("https://example.com/a/nda.pdf?x=1"), "nda.pdf");
        assert_eq!(filename_from_url("https://example.com/"), "downloaded");
    }

    #[tokio::test]
    async fn loads_local_file_with_detected_type() {
        let mut file = tempfile::Builder::new().suffix(".bin").tempfile().unwrap();
        file.write_all(b"%PDF-1.4 fake").unwrap();
        let doc = load_document(file.path().to_str().unwrap(), 5)
            .await
            .unwrap();
        assert_eq!(doc.mime_type, MIME_PDF);
        assert_eq!(doc.bytes, b"%PDF-1.4 fake");
        assert!(doc.name.unwrap().ends_with(".bin"));
    }

    #[tokio::test]
    async fn missing_file_is_input_unavailable() {
        let err = load_document("/no/such/dir/lease.pdf", 5).await.unwrap_err();
        assert!(matches!(err, ClausewiseError::InputUnavailable { .. }));
    }
}
