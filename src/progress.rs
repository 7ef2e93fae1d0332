//! Progress events emitted while a document is turned into text.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] into
//! [`crate::pipeline::extract::TextExtractor::extract`] to receive a
//! [`ProcessingProgress`] each time the extractor moves forward. Events are
//! delivered synchronously, in order, from the thread doing the work; the
//! extractor keeps no shared progress state of its own.
//!
//! # Example
//!
//! ```rust
//! use clausewise::progress::{ExtractionProgressCallback, ProcessingProgress};
//! use std::sync::{Arc, Mutex};
//!
//! let seen: Arc<Mutex<Vec<f32>>> = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! let callback = move |p: &ProcessingProgress| sink.lock().unwrap().push(p.progress);
//! callback.on_progress(&ProcessingProgress::complete());
//! assert_eq!(seen.lock().unwrap().as_slice(), &[100.0]);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Extraction stage reported alongside each progress value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionStage {
    /// Size and type checks (0 %).
    Validating,
    /// Direct text extraction (10–80 %).
    Extracting,
    /// Image-based fallback branch (80–95 %).
    Ocr,
    /// Text is ready (100 %).
    Complete,
}

impl fmt::Display for ExtractionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExtractionStage::Validating => "validating",
            ExtractionStage::Extracting => "extracting",
            ExtractionStage::Ocr => "ocr",
            ExtractionStage::Complete => "complete",
        };
        f.write_str(s)
    }
}

/// One progress event: `{stage, progress ∈ [0, 100], message}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingProgress {
    pub stage: ExtractionStage,
    pub progress: f32,
    pub message: String,
}

impl ProcessingProgress {
    /// Build an event, clamping `progress` into `[0, 100]`.
    pub fn new(stage: ExtractionStage, progress: f32, message: impl Into<String>) -> Self {
        Self {
            stage,
            progress: progress.clamp(0.0, 100.0),
            message: message.into(),
        }
    }

    /// The terminal success event.
    pub fn complete() -> Self {
        Self::new(ExtractionStage::Complete, 100.0, "Text extraction complete!")
    }
}

/// Receives extraction progress events.
///
/// Implementations must be `Send + Sync`: extraction runs on a blocking
/// worker thread, not on the caller's task.
pub trait ExtractionProgressCallback: Send + Sync {
    fn on_progress(&self, progress: &ProcessingProgress);
}

impl<F> ExtractionProgressCallback for F
where
    F: Fn(&ProcessingProgress) + Send + Sync,
{
    fn on_progress(&self, progress: &ProcessingProgress) {
        self(progress)
    }
}

/// Convenience alias for the shared callback handle.
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

/// Internal reporter that tolerates an absent callback.
pub(crate) struct ProgressReporter<'a> {
    callback: Option<&'a dyn ExtractionProgressCallback>,
    cancelled: Option<&'a AtomicBool>,
}

impl<'a> ProgressReporter<'a> {
    pub(crate) fn new(callback: Option<&'a dyn ExtractionProgressCallback>) -> Self {
        Self {
            callback,
            cancelled: None,
        }
    }

    /// Go silent once `flag` is set.
    pub(crate) fn cancellable(mut self, flag: &'a AtomicBool) -> Self {
        self.cancelled = Some(flag);
        self
    }

    pub(crate) fn report(&self, stage: ExtractionStage, progress: f32, message: impl Into<String>) {
        if self.cancelled.is_some_and(|c| c.load(Ordering::Acquire)) {
            return;
        }
        if let Some(cb) = self.callback {
            cb.on_progress(&ProcessingProgress::new(stage, progress, message));
        }
    }
}
