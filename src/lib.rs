//! # clausewise
//!
//! Plain-language analysis of legal documents.
//!
//! A document (PDF, DOCX, or pasted text) is reduced to plain text, sent to
//! a generative model with a fixed JSON schema, and returned as a typed
//! [`Analysis`]: summary, key facts, risk assessment and an action plan.
//!
//! ## Pipeline Overview
//!
//! ```text
//! file / text
//!  │
//!  ├─ 1. Validate  size ≤ 10 MB, PDF/DOCX/DOC; or 50–50,000 chars of text
//!  ├─ 2. Extract   PDF pages in order (PDFium) / DOCX body XML, with progress
//!  ├─ 3. Prompt    fixed schema + target language + text
//!  ├─ 4. Model     one call, bounded by a timeout
//!  ├─ 5. Validate  fence stripping, strict typed parsing
//!  └─ 6. Fallback  deterministic analysis on any model-path failure
//! ```
//!
//! The analysis stage never fails: a broken model call yields a fallback
//! [`Analysis`] with confidence `0.75` (see [`Analysis::is_fallback`]).
//! Validation and extraction errors are returned as [`ClausewiseError`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use clausewise::{AnalysisClient, AnalysisRequest, AnalyzerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / ...
//!     let config = AnalyzerConfig::default();
//!     let client = AnalysisClient::from_config(&config)?;
//!     let request = AnalysisRequest::new(clausewise::samples::LEASE).with_language("es");
//!     let analysis = client.analyze(&request).await;
//!     println!("{}", analysis.summary.tldr);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `clausewise` binary (clap + anyhow + tracing-subscriber + indicatif + dotenvy) |
//!
//! ```toml
//! clausewise = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analysis;
pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod fallback;
pub mod pipeline;
pub mod processor;
pub mod progress;
pub mod prompts;
pub mod samples;
pub mod server;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analysis::{parse_analysis, Analysis};
pub use client::{AnalysisClient, AnalysisRequest, LlmModelClient, ModelClient};
pub use config::{AnalyzerConfig, AnalyzerConfigBuilder};
pub use document::{normalize_text, validate_document, Document, DocumentKind};
pub use error::{AnalysisFault, ClausewiseError, ExtractionFault};
pub use fallback::{DocumentClassifier, FallbackAnalyzer, KeywordClassifier};
pub use pipeline::extract::{ExtractedText, TextExtractor, TextSource};
pub use pipeline::ocr::is_ocr_sentinel;
pub use processor::{ProcessingObserver, ProcessingOptions, ProcessingStage, Processor};
pub use progress::{ExtractionProgressCallback, ExtractionStage, ProcessingProgress, ProgressCallback};
pub use store::{AnalysisStore, MemoryStore, SavedAnalysisRecord};
