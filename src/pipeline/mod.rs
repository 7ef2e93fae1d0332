//! Pipeline stages for document-to-text extraction and response cleanup.
//!
//! Each submodule implements one step. Format readers are synchronous and
//! CPU-bound; [`extract::TextExtractor`] runs them on a blocking worker.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──┬──▶ pdf  ──▶ [ocr]
//! (path/URL) (stages) └──▶ docx
//!
//! model response ──▶ sanitize ──▶ analysis::parse_analysis
//! ```
//!
//! 1. [`input`]: load a local path or URL into a [`crate::Document`]
//! 2. [`extract`]: validate, dispatch by kind, report progress
//! 3. [`pdf`]: page-ordered text via PDFium in a scoped session
//! 4. [`docx`]: raw text from the Word body XML
//! 5. [`ocr`]: branch for image-based PDFs
//! 6. [`sanitize`]: strip code fences from model output

pub mod docx;
pub mod extract;
pub mod input;
pub mod ocr;
pub mod pdf;
pub mod sanitize;
