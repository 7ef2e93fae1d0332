//! Raw-text extraction from Word documents.
//!
//! A DOCX file is a zip archive whose body lives in `word/document.xml`.
//! Text runs (`<w:t>`) are concatenated; paragraphs (`<w:p>`) end with a
//! blank line, `<w:tab/>` becomes a tab and `<w:br/>`/`<w:cr/>` a newline.
//! Formatting, tables and headers/footers are ignored.
//!
//! The body part is inflated through a byte cap so a small archive cannot
//! expand into an unbounded buffer.

use crate::error::ExtractionFault;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use tracing::debug;
use zip::ZipArchive;

const BODY_PART: &str = "word/document.xml";

/// Body XML allowed per character of text the caller will accept.
/// Run and paragraph markup outweighs the text itself many times over.
pub const XML_BYTES_PER_TEXT_CHAR: u64 = 64;

/// Extract the raw text of a DOCX document, untrimmed.
///
/// Fails when `word/document.xml` inflates past `max_xml_bytes`.
pub fn extract_docx_text(bytes: &[u8], max_xml_bytes: u64) -> Result<String, ExtractionFault> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractionFault::Docx(format!("invalid DOCX/ZIP container: {e}")))?;

    let entry = archive
        .by_name(BODY_PART)
        .map_err(|e| ExtractionFault::Docx(format!("missing {BODY_PART}: {e}")))?;
    if entry.size() > max_xml_bytes {
        return Err(oversized(entry.size(), max_xml_bytes));
    }

    // The declared size is only a header field; cap the actual inflation too.
    let mut raw = Vec::new();
    entry
        .take(max_xml_bytes + 1)
        .read_to_end(&mut raw)
        .map_err(|e| ExtractionFault::Docx(format!("unreadable {BODY_PART}: {e}")))?;
    if raw.len() as u64 > max_xml_bytes {
        return Err(oversized(raw.len() as u64, max_xml_bytes));
    }
    let xml = String::from_utf8(raw)
        .map_err(|e| ExtractionFault::Docx(format!("{BODY_PART} is not UTF-8: {e}")))?;

    let text = text_from_document_xml(&xml)?;
    debug!("DOCX body: {} bytes XML → {} chars text", xml.len(), text.chars().count());
    Ok(text)
}

fn oversized(size: u64, limit: u64) -> ExtractionFault {
    ExtractionFault::Docx(format!(
        "{BODY_PART} inflates to more than {limit} bytes (at least {size})"
    ))
}

fn text_from_document_xml(xml: &str) -> Result<String, ExtractionFault> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    reader.trim_text(false);

    let mut out = String::with_capacity(xml.len() / 4);
    let mut in_text_run = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.name().as_ref() == b"w:t" => in_text_run = true,
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text_run = false,
                b"w:p" => out.push_str("\n\n"),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => out.push('\t'),
                b"w:br" | b"w:cr" => out.push('\n'),
                b"w:p" => out.push_str("\n\n"),
                _ => {}
            },
            Ok(Event::Text(e)) if in_text_run => {
                let text = e
                    .unescape()
                    .map_err(|err| ExtractionFault::Docx(format!("bad text run: {err}")))?;
                out.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ExtractionFault::Docx(format!(
                    "malformed XML at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
        }
        buf.clear();
    }

    Ok(out)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const LIMIT: u64 = 1 << 20;

    /// Build a minimal DOCX whose body has one `<w:p>` per paragraph.
    pub(crate) fn make_docx(paragraphs: &[&str]) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{p}</w:t></w:r></w:p>"))
            .collect();
        let xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             <w:body>{body}</w:body></w:document>"
        );
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file(BODY_PART, SimpleFileOptions::default()).unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn extracts_paragraphs_in_order() {
        let bytes = make_docx(&["NON-DISCLOSURE AGREEMENT", "Both parties agree."]);
        let text = extract_docx_text(&bytes, LIMIT).unwrap();
        assert_eq!(
            text.trim(),
            "NON-DISCLOSURE AGREEMENT\n\nBoth parties agree."
        );
    }

    #[test]
    fn unescapes_entities() {
        let bytes = make_docx(&["Smith &amp; Sons &lt;Tenant&gt;"]);
        assert_eq!(extract_docx_text(&bytes, LIMIT).unwrap().trim(), "Smith & Sons <Tenant>");
    }

    #[test]
    fn tabs_and_breaks() {
        let xml = "<w:document><w:body><w:p><w:r><w:t>A</w:t><w:tab/><w:t>B</w:t><w:br/><w:t>C</w:t></w:r></w:p></w:body></w:document>";
        assert_eq!(text_from_document_xml(xml).unwrap(), "A\tB\nC\n\n");
    }

    #[test]
    fn ignores_text_outside_runs() {
        let xml = "<w:document><w:body><w:p><w:instrText>PAGE</w:instrText><w:r><w:t>Body</w:t></w:r></w:p></w:body></w:document>";
        assert_eq!(text_from_document_xml(xml).unwrap().trim(), "Body");
    }

    #[test]
    fn empty_body_yields_blank_text() {
        let bytes = make_docx(&[]);
        assert!(extract_docx_text(&bytes, LIMIT).unwrap().trim().is_empty());
    }

    #[test]
    fn not_a_zip_is_docx_fault() {
        let err = extract_docx_text(b"\xD0\xCF\x11\xE0 legacy word", LIMIT).unwrap_err();
        assert!(matches!(err, ExtractionFault::Docx(_)));
    }

    #[test]
    fn zip_without_body_part_is_docx_fault() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("word/styles.xml", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"<w:styles/>").unwrap();
        let bytes = zip.finish().unwrap().into_inner();
        let err = extract_docx_text(&bytes, LIMIT).unwrap_err();
        assert!(err.to_string().contains("word/document.xml"));
    }

    #[test]
    fn inflated_body_over_cap_is_docx_fault() {
        // ~2 MiB of XML deflates to a few KiB.
        let run = "a".repeat(2 << 20);
        let bytes = make_docx(&[&run]);
        assert!(bytes.len() < 64 * 1024, "fixture compressed to {}", bytes.len());

        let err = extract_docx_text(&bytes, LIMIT).unwrap_err();
        assert!(matches!(err, ExtractionFault::Docx(_)));
        assert!(err.to_string().contains("inflates to more than"), "{err}");
    }

    #[test]
    fn small_body_under_cap_is_accepted() {
        let bytes = make_docx(&["Within bounds."]);
        let text = extract_docx_text(&bytes, 4096).unwrap();
        assert_eq!(text.trim(), "Within bounds.");
    }
}
