//! Configuration for document extraction and analysis.
//!
//! Every knob lives in [`AnalyzerConfig`], built via its
//! [`AnalyzerConfigBuilder`]. One struct is cheap to clone into each request
//! and easy to print when two runs need comparing.

use crate::error::ClausewiseError;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default model: the service was designed around Gemini Flash.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Configuration shared by the extractor, the analysis client and the server.
///
/// # Example
/// ```rust
/// use clausewise::AnalyzerConfig;
///
/// let config = AnalyzerConfig::builder()
///     .model("gemini-1.5-flash")
///     .api_timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_text_chars, 50_000);
/// ```
#[derive(Clone)]
pub struct AnalyzerConfig {
    /// LLM model identifier. If None, [`DEFAULT_MODEL`] is used.
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.2.
    ///
    /// The model must emit strict JSON; low temperature keeps it on-schema.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 4096.
    pub max_tokens: usize,

    /// Model call timeout in seconds. Default: 60. Expiry triggers the fallback.
    pub api_timeout_secs: u64,

    /// Extraction timeout in seconds. Default: 120. Expiry fails extraction.
    pub extraction_timeout_secs: u64,

    /// Explicit path to the PDFium shared library.
    ///
    /// When None, `PDFIUM_LIB_PATH` is consulted, then the system library path.
    pub pdfium_library_path: Option<PathBuf>,

    /// Upload size cap in bytes. Default: 10 MiB.
    pub max_file_bytes: u64,

    /// Minimum trimmed length of pasted text. Default: 50.
    pub min_text_chars: usize,

    /// Maximum raw length of pasted or submitted text. Default: 50 000.
    pub max_text_chars: usize,

    /// Below this many trimmed characters a PDF is treated as image-based. Default: 50.
    pub ocr_threshold_chars: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.2,
            max_tokens: 4096,
            api_timeout_secs: 60,
            extraction_timeout_secs: 120,
            pdfium_library_path: None,
            max_file_bytes: 10 * 1024 * 1024,
            min_text_chars: 50,
            max_text_chars: 50_000,
            ocr_threshold_chars: 50,
        }
    }
}

impl fmt::Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("extraction_timeout_secs", &self.extraction_timeout_secs)
            .field("pdfium_library_path", &self.pdfium_library_path)
            .field("max_file_bytes", &self.max_file_bytes)
            .field("min_text_chars", &self.min_text_chars)
            .field("max_text_chars", &self.max_text_chars)
            .field("ocr_threshold_chars", &self.ocr_threshold_chars)
            .finish()
    }
}

impl AnalyzerConfig {
    /// Create a new builder for `AnalyzerConfig`.
    pub fn builder() -> AnalyzerConfigBuilder {
        AnalyzerConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model to request, falling back to [`DEFAULT_MODEL`].
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`AnalyzerConfig`].
#[derive(Debug)]
pub struct AnalyzerConfigBuilder {
    config: AnalyzerConfig,
}

impl AnalyzerConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn extraction_timeout_secs(mut self, secs: u64) -> Self {
        self.config.extraction_timeout_secs = secs;
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    pub fn max_file_bytes(mut self, bytes: u64) -> Self {
        self.config.max_file_bytes = bytes;
        self
    }

    pub fn min_text_chars(mut self, n: usize) -> Self {
        self.config.min_text_chars = n;
        self
    }

    pub fn max_text_chars(mut self, n: usize) -> Self {
        self.config.max_text_chars = n;
        self
    }

    pub fn ocr_threshold_chars(mut self, n: usize) -> Self {
        self.config.ocr_threshold_chars = n;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalyzerConfig, ClausewiseError> {
        let c = &self.config;
        if c.api_timeout_secs == 0 {
            return Err(ClausewiseError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.extraction_timeout_secs == 0 {
            return Err(ClausewiseError::InvalidConfig(
                "Extraction timeout must be ≥ 1 second".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(ClausewiseError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.min_text_chars > c.max_text_chars {
            return Err(ClausewiseError::InvalidConfig(format!(
                "min_text_chars ({}) exceeds max_text_chars ({})",
                c.min_text_chars, c.max_text_chars
            )));
        }
        if c.max_file_bytes == 0 {
            return Err(ClausewiseError::InvalidConfig(
                "max_file_bytes must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}
