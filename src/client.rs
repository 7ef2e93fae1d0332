//! Analysis client: prompt → model → sanitize → parse, with fallback.
//!
//! ## Failure model
//!
//! The model path has four ways to fail (invocation error, timeout, non-JSON
//! response, wrong shape). [`AnalysisClient::try_analyze`] reports them as
//! [`AnalysisFault`]; [`AnalysisClient::analyze`] logs the fault and returns
//! the [`FallbackAnalyzer`] result instead. There is no retry: one failure
//! means one substitution.

use crate::analysis::{parse_analysis, Analysis};
use crate::config::{AnalyzerConfig, DEFAULT_MODEL};
use crate::error::{AnalysisFault, ClausewiseError};
use crate::fallback::FallbackAnalyzer;
use crate::pipeline::sanitize::sanitize_response;
use crate::prompts::build_prompt;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Environment variable holding a Gemini API key.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// One analysis job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub text: String,
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en".to_string()
}

impl AnalysisRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            document_type: None,
            language: default_language(),
        }
    }

    pub fn with_document_type(mut self, document_type: impl Into<String>) -> Self {
        self.document_type = Some(document_type.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

/// Single round trip to a generative model: prompt in, raw text out.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, AnalysisFault>;
}

/// [`ModelClient`] backed by an edgequake-llm provider.
pub struct LlmModelClient {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
}

impl LlmModelClient {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &AnalyzerConfig) -> Self {
        Self {
            provider,
            options: build_options(config),
        }
    }

    /// Resolve the provider from `config` and the environment.
    pub fn from_config(config: &AnalyzerConfig) -> Result<Self, ClausewiseError> {
        Ok(Self::new(resolve_provider(config)?, config))
    }
}

#[async_trait]
impl ModelClient for LlmModelClient {
    async fn complete(&self, prompt: &str) -> Result<String, AnalysisFault> {
        let messages = vec![ChatMessage::user(prompt)];
        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| AnalysisFault::ModelInvocation(e.to_string()))?;
        debug!(
            "Model call: {} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

/// Stand-in used when no provider could be resolved. Every call fails, so
/// every analysis is the fallback.
#[derive(Debug, Clone)]
pub struct UnconfiguredModel {
    reason: String,
}

impl UnconfiguredModel {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ModelClient for UnconfiguredModel {
    async fn complete(&self, _prompt: &str) -> Result<String, AnalysisFault> {
        Err(AnalysisFault::ModelInvocation(self.reason.clone()))
    }
}

fn build_options(config: &AnalyzerConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

fn create_provider(name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, ClausewiseError> {
    ProviderFactory::create_llm_provider(name, model).map_err(|e| {
        ClausewiseError::ProviderNotConfigured {
            provider: name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. Pre-built provider (`config.provider`)
/// 2. Named provider (`config.provider_name`) with `config.model`
/// 3. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, when both are set
/// 4. Gemini when `GEMINI_API_KEY` is set
/// 5. [`ProviderFactory::from_env`] auto-detection
pub fn resolve_provider(config: &AnalyzerConfig) -> Result<Arc<dyn LLMProvider>, ClausewiseError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        return create_provider(name, config.model_or_default());
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if std::env::var(GEMINI_API_KEY_ENV).is_ok_and(|k| !k.is_empty()) {
        return create_provider("gemini", config.model.as_deref().unwrap_or(DEFAULT_MODEL));
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ClausewiseError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                 Set {GEMINI_API_KEY_ENV}, or configure a provider.\n\
                 Error: {e}"
            ),
        })?;
    Ok(llm_provider)
}

/// Turns text into an [`Analysis`], never failing.
#[derive(Clone)]
pub struct AnalysisClient {
    model: Arc<dyn ModelClient>,
    fallback: FallbackAnalyzer,
    timeout: Duration,
}

impl AnalysisClient {
    pub fn new(model: Arc<dyn ModelClient>, config: &AnalyzerConfig) -> Self {
        Self {
            model,
            fallback: FallbackAnalyzer::default(),
            timeout: Duration::from_secs(config.api_timeout_secs),
        }
    }

    pub fn with_fallback(mut self, fallback: FallbackAnalyzer) -> Self {
        self.fallback = fallback;
        self
    }

    /// Client backed by the provider resolved from `config`.
    pub fn from_config(config: &AnalyzerConfig) -> Result<Self, ClausewiseError> {
        let model = LlmModelClient::from_config(config)?;
        Ok(Self::new(Arc::new(model), config))
    }

    /// Like [`from_config`](Self::from_config), but degrades to
    /// fallback-only analysis instead of failing when no provider is set up.
    pub fn from_config_or_fallback(config: &AnalyzerConfig) -> Self {
        Self::from_config(config).unwrap_or_else(|e| {
            warn!("{e}\nModel analysis disabled; every request will use the fallback analyzer");
            Self::new(Arc::new(UnconfiguredModel::new(e.to_string())), config)
        })
    }

    /// Analyze, substituting the fallback on any model-path fault.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Analysis {
        match self.try_analyze(request).await {
            Ok(analysis) => analysis,
            Err(fault) => {
                warn!("Analysis failed, using fallback: {fault}");
                self.fallback
                    .analyze(&request.text, request.document_type.as_deref())
            }
        }
    }

    /// The model path alone; faults are returned, not absorbed.
    pub async fn try_analyze(&self, request: &AnalysisRequest) -> Result<Analysis, AnalysisFault> {
        let start = Instant::now();
        let prompt = build_prompt(&request.text, Some(&request.language));

        let raw = tokio::time::timeout(self.timeout, self.model.complete(&prompt))
            .await
            .map_err(|_| AnalysisFault::Timeout {
                secs: self.timeout.as_secs(),
            })??;

        let analysis = parse_analysis(&sanitize_response(&raw))?;
        info!(
            "Model analysis complete in {}ms ({} red flags, {} actions)",
            start.elapsed().as_millis(),
            analysis.risk_assessment.red_flags.len(),
            analysis.action_plan.len()
        );
        Ok(analysis)
    }
}
