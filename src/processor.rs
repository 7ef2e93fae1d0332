//! Processing state machine: upload → extract → analyze → complete.
//!
//! [`Processor`] drives one request through the stages and reports them to
//! an optional [`ProcessingObserver`]. Extraction and normalization errors
//! stop the machine in a failed state and are returned to the caller.
//! Analysis never fails here: the client substitutes a fallback, and both
//! outcomes complete the machine the same way.
//!
//! While in `analyze` the model call gives no progress signal, so progress
//! is simulated: it ticks towards [`ANALYZE_PROGRESS_CEILING`] and jumps to
//! 100 when the analysis arrives.

use crate::analysis::Analysis;
use crate::client::{AnalysisClient, AnalysisRequest};
use crate::config::AnalyzerConfig;
use crate::document::{normalize_text, Document};
use crate::error::ClausewiseError;
use crate::pipeline::extract::{ExtractedText, TextExtractor};
use crate::progress::{ExtractionProgressCallback, ProcessingProgress, ProgressCallback};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Highest simulated progress value while waiting on the model.
pub const ANALYZE_PROGRESS_CEILING: f32 = 90.0;

const ANALYZE_TICK: Duration = Duration::from_millis(500);
const ANALYZE_STEP: f32 = 10.0;

/// Stage of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStage {
    Upload,
    Extract,
    Analyze,
    Complete,
}

impl fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProcessingStage::Upload => "upload",
            ProcessingStage::Extract => "extract",
            ProcessingStage::Analyze => "analyze",
            ProcessingStage::Complete => "complete",
        };
        f.write_str(s)
    }
}

impl ProcessingStage {
    /// The only stage reachable from `self` by a forward transition.
    fn next(self) -> Option<ProcessingStage> {
        match self {
            ProcessingStage::Upload => Some(ProcessingStage::Extract),
            ProcessingStage::Extract => Some(ProcessingStage::Analyze),
            ProcessingStage::Analyze => Some(ProcessingStage::Complete),
            ProcessingStage::Complete => None,
        }
    }
}

/// Stage bookkeeping with an explicit error condition.
#[derive(Debug, Clone, PartialEq)]
pub struct StageMachine {
    stage: ProcessingStage,
    error: Option<String>,
}

impl Default for StageMachine {
    fn default() -> Self {
        Self {
            stage: ProcessingStage::Upload,
            error: None,
        }
    }
}

impl StageMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> ProcessingStage {
        self.stage
    }

    /// Message of the failure that halted the machine, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Move one stage forward. Skipping, going back or moving while failed
    /// is rejected.
    pub fn advance(&mut self, to: ProcessingStage) -> Result<(), ClausewiseError> {
        if self.is_failed() || self.stage.next() != Some(to) {
            return Err(ClausewiseError::InvalidTransition {
                from: self.stage.to_string(),
                to: to.to_string(),
            });
        }
        self.stage = to;
        Ok(())
    }

    /// Halt in the current stage.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// Back to `upload`, clearing any error. Allowed from every state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Receives stage changes, progress and failures for one request.
///
/// All methods default to no-ops.
pub trait ProcessingObserver: Send + Sync {
    fn on_stage(&self, _stage: ProcessingStage) {}
    fn on_progress(&self, _stage: ProcessingStage, _progress: f32, _message: &str) {}
    fn on_error(&self, _error: &ClausewiseError) {}
}

/// Forwards extractor progress to the observer as `extract` progress.
struct ExtractForwarder(Arc<dyn ProcessingObserver>);

impl ExtractionProgressCallback for ExtractForwarder {
    fn on_progress(&self, progress: &ProcessingProgress) {
        self.0
            .on_progress(ProcessingStage::Extract, progress.progress, &progress.message);
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct ProcessingOutcome {
    pub analysis: Analysis,
    /// Present for document input.
    pub extracted: Option<ExtractedText>,
}

/// Caller options shared by both entry points.
#[derive(Debug, Clone, Default)]
pub struct ProcessingOptions {
    pub document_type: Option<String>,
    pub language: Option<String>,
}

/// Runs requests through extraction and analysis. Shareable across tasks;
/// every call owns its own [`StageMachine`].
#[derive(Clone)]
pub struct Processor {
    config: AnalyzerConfig,
    extractor: TextExtractor,
    client: AnalysisClient,
}

impl Processor {
    pub fn new(config: AnalyzerConfig, extractor: TextExtractor, client: AnalysisClient) -> Self {
        Self {
            config,
            extractor,
            client,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn extractor(&self) -> &TextExtractor {
        &self.extractor
    }

    pub fn client(&self) -> &AnalysisClient {
        &self.client
    }

    /// Validate, extract and analyze an uploaded document. Extracted text
    /// longer than `max_text_chars` halts the run before the model is called.
    pub async fn process_document(
        &self,
        doc: Document,
        options: &ProcessingOptions,
        observer: Option<Arc<dyn ProcessingObserver>>,
    ) -> Result<ProcessingOutcome, ClausewiseError> {
        let mut machine = StageMachine::new();
        self.enter(&mut machine, ProcessingStage::Extract, observer.as_deref())?;

        let forwarder: Option<ProgressCallback> = observer
            .clone()
            .map(|o| Arc::new(ExtractForwarder(o)) as ProgressCallback);
        let extracted = match self.extractor.extract(doc, forwarder).await {
            Ok(extracted) => extracted,
            Err(e) => return Err(halt(&mut machine, e, observer.as_deref())),
        };
        if extracted.ocr_required() {
            warn!("Document needs OCR; analysing the placeholder text");
        }
        let len = extracted.text.chars().count();
        let max = self.config.max_text_chars;
        if len > max {
            let e = ClausewiseError::TextTooLong { len, max };
            return Err(halt(&mut machine, e, observer.as_deref()));
        }

        let analysis = self
            .analyze_stage(&mut machine, &extracted.text, options, observer.as_deref())
            .await?;
        Ok(ProcessingOutcome {
            analysis,
            extracted: Some(extracted),
        })
    }

    /// Normalize and analyze pasted text.
    pub async fn process_text(
        &self,
        text: &str,
        options: &ProcessingOptions,
        observer: Option<Arc<dyn ProcessingObserver>>,
    ) -> Result<ProcessingOutcome, ClausewiseError> {
        let mut machine = StageMachine::new();
        self.enter(&mut machine, ProcessingStage::Extract, observer.as_deref())?;

        let normalized = match normalize_text(text, &self.config) {
            Ok(t) => t,
            Err(e) => return Err(halt(&mut machine, e, observer.as_deref())),
        };
        if let Some(o) = observer.as_deref() {
            o.on_progress(ProcessingStage::Extract, 100.0, "Text ready for analysis");
        }

        let analysis = self
            .analyze_stage(&mut machine, &normalized, options, observer.as_deref())
            .await?;
        Ok(ProcessingOutcome {
            analysis,
            extracted: None,
        })
    }

    async fn analyze_stage(
        &self,
        machine: &mut StageMachine,
        text: &str,
        options: &ProcessingOptions,
        observer: Option<&dyn ProcessingObserver>,
    ) -> Result<Analysis, ClausewiseError> {
        self.enter(machine, ProcessingStage::Analyze, observer)?;

        let mut request = AnalysisRequest::new(text);
        request.document_type = options.document_type.clone();
        if let Some(ref lang) = options.language {
            request.language = lang.clone();
        }

        let analysis = {
            let work = self.client.analyze(&request);
            tokio::pin!(work);
            let mut ticker = tokio::time::interval(ANALYZE_TICK);
            let mut progress = 0.0f32;
            loop {
                tokio::select! {
                    analysis = &mut work => break analysis,
                    _ = ticker.tick() => {
                        if let Some(o) = observer {
                            o.on_progress(ProcessingStage::Analyze, progress, "Analyzing document...");
                        }
                        progress = (progress + ANALYZE_STEP).min(ANALYZE_PROGRESS_CEILING);
                    }
                }
            }
        };

        if let Some(o) = observer {
            o.on_progress(ProcessingStage::Analyze, 100.0, "Analysis complete!");
        }
        self.enter(machine, ProcessingStage::Complete, observer)?;
        info!(fallback = analysis.is_fallback(), "Processing complete");
        Ok(analysis)
    }

    fn enter(
        &self,
        machine: &mut StageMachine,
        stage: ProcessingStage,
        observer: Option<&dyn ProcessingObserver>,
    ) -> Result<(), ClausewiseError> {
        machine.advance(stage)?;
        if let Some(o) = observer {
            o.on_stage(stage);
        }
        Ok(())
    }
}

fn halt(
    machine: &mut StageMachine,
    error: ClausewiseError,
    observer: Option<&dyn ProcessingObserver>,
) -> ClausewiseError {
    machine.fail(error.to_string());
    warn!(
        stage = %machine.stage(),
        error = machine.error().unwrap_or_default(),
        "Processing halted"
    );
    if let Some(o) = observer {
        o.on_error(&error);
    }
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tests::VALID_JSON;
    use crate::client::tests::ScriptedModel;
    use crate::document::{MIME_DOCX, MIME_PDF};
    use crate::error::AnalysisFault;
    use crate::pipeline::docx::tests::make_docx;
    use crate::pipeline::ocr::SentinelOcr;
    use crate::pipeline::pdf::tests::FakePdfEngine;
    use crate::samples::SampleKind;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        stages: Mutex<Vec<ProcessingStage>>,
        progress: Mutex<Vec<(ProcessingStage, f32)>>,
        errors: Mutex<Vec<String>>,
    }

    impl ProcessingObserver for Recorder {
        fn on_stage(&self, stage: ProcessingStage) {
            self.stages.lock().unwrap().push(stage);
        }
        fn on_progress(&self, stage: ProcessingStage, progress: f32, _message: &str) {
            self.progress.lock().unwrap().push((stage, progress));
        }
        fn on_error(&self, error: &ClausewiseError) {
            self.errors.lock().unwrap().push(error.to_string());
        }
    }

    fn processor(model: ScriptedModel, pages: &[&str]) -> Processor {
        let config = AnalyzerConfig::default();
        let extractor = TextExtractor::with_engines(
            config.clone(),
            Arc::new(FakePdfEngine::with_pages(pages)),
            Arc::new(SentinelOcr),
        );
        let client = AnalysisClient::new(Arc::new(model), &config);
        Processor::new(config, extractor, client)
    }

    #[test]
    fn machine_moves_forward_only() {
        let mut m = StageMachine::new();
        assert!(m.advance(ProcessingStage::Analyze).is_err());
        m.advance(ProcessingStage::Extract).unwrap();
        m.advance(ProcessingStage::Analyze).unwrap();
        assert!(m.advance(ProcessingStage::Extract).is_err());
        m.advance(ProcessingStage::Complete).unwrap();
        assert!(m.advance(ProcessingStage::Complete).is_err());
    }

    #[test]
    fn failed_machine_stays_put_until_reset() {
        let mut m = StageMachine::new();
        m.advance(ProcessingStage::Extract).unwrap();
        m.fail("bad file");
        assert_eq!(m.stage(), ProcessingStage::Extract);
        assert_eq!(m.error(), Some("bad file"));
        assert!(m.advance(ProcessingStage::Analyze).is_err());
        m.reset();
        assert_eq!(m.stage(), ProcessingStage::Upload);
        assert!(!m.is_failed());
    }

    #[test]
    fn reset_from_complete() {
        let mut m = StageMachine::new();
        for s in [ProcessingStage::Extract, ProcessingStage::Analyze, ProcessingStage::Complete] {
            m.advance(s).unwrap();
        }
        m.reset();
        assert_eq!(m, StageMachine::new());
    }

    #[tokio::test]
    async fn text_runs_all_stages() {
        let p = processor(ScriptedModel::replying(VALID_JSON), &[]);
        let rec = Arc::new(Recorder::default());
        let out = p
            .process_text(SampleKind::Lease.text(), &ProcessingOptions::default(), Some(rec.clone()))
            .await
            .unwrap();

        assert!(!out.analysis.is_fallback());
        assert_eq!(
            *rec.stages.lock().unwrap(),
            vec![ProcessingStage::Extract, ProcessingStage::Analyze, ProcessingStage::Complete]
        );
        let progress = rec.progress.lock().unwrap();
        assert_eq!(progress.last(), Some(&(ProcessingStage::Analyze, 100.0)));
    }

    #[tokio::test]
    async fn fallback_still_completes() {
        let p = processor(
            ScriptedModel::failing(AnalysisFault::ModelInvocation("down".into())),
            &[],
        );
        let rec = Arc::new(Recorder::default());
        let out = p
            .process_text(SampleKind::Nda.text(), &ProcessingOptions::default(), Some(rec.clone()))
            .await
            .unwrap();
        assert!(out.analysis.is_fallback());
        assert_eq!(rec.stages.lock().unwrap().last(), Some(&ProcessingStage::Complete));
    }

    #[tokio::test]
    async fn short_text_halts_in_extract() {
        let p = processor(ScriptedModel::replying(VALID_JSON), &[]);
        let rec = Arc::new(Recorder::default());
        let err = p
            .process_text("too short", &ProcessingOptions::default(), Some(rec.clone()))
            .await
            .unwrap_err();

        assert!(matches!(err, ClausewiseError::TextTooShort { .. }));
        assert_eq!(*rec.stages.lock().unwrap(), vec![ProcessingStage::Extract]);
        assert_eq!(rec.errors.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn document_progress_forwarded_then_analyzed() {
        let p = processor(
            ScriptedModel::replying(VALID_JSON),
            &[SampleKind::Lease.text(), "Page two of the lease."],
        );
        let rec = Arc::new(Recorder::default());
        let doc = Document::new(b"%PDF-1.7".to_vec(), MIME_PDF);
        let out = p
            .process_document(doc, &ProcessingOptions::default(), Some(rec.clone()))
            .await
            .unwrap();

        let extracted = out.extracted.unwrap();
        assert_eq!(extracted.page_count, Some(2));
        let progress = rec.progress.lock().unwrap();
        let extract: Vec<f32> = progress
            .iter()
            .filter(|(s, _)| *s == ProcessingStage::Extract)
            .map(|(_, p)| *p)
            .collect();
        assert_eq!(extract.last(), Some(&100.0));
        assert!(extract.windows(2).all(|w| w[1] >= w[0]));
    }

    #[tokio::test]
    async fn extraction_failure_is_surfaced() {
        let p = processor(ScriptedModel::replying(VALID_JSON), &[]);
        let rec = Arc::new(Recorder::default());
        let doc = Document::new(make_docx(&[""]), MIME_DOCX);
        let err = p
            .process_document(doc, &ProcessingOptions::default(), Some(rec.clone()))
            .await
            .unwrap_err();

        assert!(matches!(err, ClausewiseError::ExtractionFailed));
        assert!(!rec.stages.lock().unwrap().contains(&ProcessingStage::Analyze));
    }

    #[tokio::test]
    async fn options_reach_the_fallback() {
        let p = processor(
            ScriptedModel::failing(AnalysisFault::ResponseParse("x".into())),
            &[],
        );
        let options = ProcessingOptions {
            document_type: Some("will".into()),
            language: Some("de".into()),
        };
        let text = "I leave my estate and all of my belongings to my children equally.";
        let out = p.process_text(text, &options, None).await.unwrap();
        assert!(out.analysis.summary.tldr.starts_with("This will"));
    }

    #[tokio::test]
    async fn oversized_extraction_halts_before_analysis() {
        let page = "word ".repeat(12_000);
        let p = processor(ScriptedModel::replying(VALID_JSON), &[&page, &page]);
        let rec = Arc::new(Recorder::default());
        let doc = Document::new(b"%PDF-1.7".to_vec(), MIME_PDF);
        let err = p
            .process_document(doc, &ProcessingOptions::default(), Some(rec.clone()))
            .await
            .unwrap_err();

        assert!(
            matches!(err, ClausewiseError::TextTooLong { max: 50_000, len } if len > 100_000),
            "{err:?}"
        );
        assert!(err.is_validation());
        assert_eq!(*rec.stages.lock().unwrap(), vec![ProcessingStage::Extract]);
        assert_eq!(rec.errors.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn extraction_at_the_cap_is_analyzed() {
        let page = "a".repeat(50_000);
        let p = processor(ScriptedModel::replying(VALID_JSON), &[&page]);
        let doc = Document::new(b"%PDF-1.7".to_vec(), MIME_PDF);
        let out = p
            .process_document(doc, &ProcessingOptions::default(), None)
            .await
            .unwrap();
        assert_eq!(out.extracted.unwrap().text.chars().count(), 50_000);
        assert!(!out.analysis.is_fallback());
    }
}
