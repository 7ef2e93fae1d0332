//! HTTP API.
//!
//! | Route | Body | Success |
//! |-------|------|---------|
//! | `GET /api/health` | none | `{"status":"ok","service":"clausewise"}` |
//! | `POST /api/analyze` | `{text, documentType?, language?}` | Analysis |
//! | `POST /api/upload` | multipart `file`, `language?`, `documentType?` | Analysis |
//! | `POST /api/save` | `{email, analysis}` | `{id, expires_at, message}` |
//!
//! Every error body is `{"error": message}`. Validation problems are 400,
//! unreadable documents 422, anything else 500 with a generic message; the
//! detail of a 500 is only logged.

use crate::analysis::analysis_from_value;
use crate::error::ClausewiseError;
use crate::pipeline::input::detect_mime;
use crate::processor::{ProcessingOptions, Processor};
use crate::store::{is_valid_email, AnalysisStore};
use crate::{client::AnalysisRequest, document::Document};
use axum::extract::rejection::JsonRejection;
use axum::extract::multipart::Field;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

/// Generic body for unexpected failures on `/api/analyze` and `/api/upload`.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";
/// Generic body for unexpected failures on `/api/save`.
pub const SAVE_FAILED_MESSAGE: &str = "Failed to save analysis";

/// Room for the multipart envelope around a maximum-size file, so an
/// oversized upload still reaches the validator and gets its message.
const MULTIPART_ALLOWANCE_BYTES: usize = 1024 * 1024;

/// Shared server state.
pub struct AppState {
    pub processor: Processor,
    pub store: Arc<dyn AnalysisStore>,
}

impl AppState {
    pub fn new(processor: Processor, store: Arc<dyn AnalysisStore>) -> Self {
        Self { processor, store }
    }
}

/// API error with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unprocessable(String),
    /// `public` is sent to the client, `detail` only logged.
    #[error("{public}")]
    Internal { public: &'static str, detail: String },
}

impl ApiError {
    fn internal(public: &'static str, detail: impl Into<String>) -> Self {
        ApiError::Internal {
            public,
            detail: detail.into(),
        }
    }
}

impl From<ClausewiseError> for ApiError {
    fn from(e: ClausewiseError) -> Self {
        if e.is_validation() {
            ApiError::BadRequest(e.to_string())
        } else if matches!(e, ClausewiseError::ExtractionFailed) {
            ApiError::Unprocessable(e.to_string())
        } else {
            ApiError::internal(INTERNAL_ERROR_MESSAGE, e.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::Unprocessable(m) => (StatusCode::UNPROCESSABLE_ENTITY, m),
            ApiError::Internal { public, detail } => {
                error!(detail = %detail, "API internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, public.to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit =
        state.processor.config().max_file_bytes as usize + MULTIPART_ALLOWANCE_BYTES;
    Router::new()
        .route("/api/health", get(health))
        .route("/api/analyze", post(analyze))
        .route("/api/upload", post(upload))
        .route("/api/save", post(save))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Bind `addr` and serve until the process stops.
pub async fn serve(addr: SocketAddr, state: Arc<AppState>) -> Result<(), ClausewiseError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ClausewiseError::Internal(format!("failed to bind {addr}: {e}")))?;
    info!("Starting clausewise API on http://{}", addr);
    axum::serve(listener, router(state))
        .await
        .map_err(|e| ClausewiseError::Internal(format!("server error: {e}")))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "clausewise" }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeBody {
    text: Option<String>,
    document_type: Option<String>,
    language: Option<String>,
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AnalyzeBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::internal(INTERNAL_ERROR_MESSAGE, e.body_text()))?;

    let text = match body.text {
        Some(t) if !t.trim().is_empty() => t,
        _ => return Err(ClausewiseError::TextRequired.into()),
    };
    let max = state.processor.config().max_text_chars;
    let len = text.chars().count();
    if len > max {
        return Err(ClausewiseError::TextTooLong { len, max }.into());
    }

    let mut request = AnalysisRequest::new(text);
    request.document_type = body.document_type;
    if let Some(lang) = body.language {
        request.language = lang;
    }

    info!(chars = len, language = %request.language, "Analyze request");
    let analysis = state.processor.client().analyze(&request).await;
    Ok(Json(analysis).into_response())
}

async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut file: Option<Document> = None;
    let mut options = ProcessingOptions::default();

    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Malformed upload: {e}")))?;
        let Some(field) = field else { break };

        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "file" => {
                let name = field.file_name().unwrap_or("document").to_string();
                let declared = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file data: {e}")))?
                    .to_vec();
                let mime = match declared {
                    Some(m) if m != "application/octet-stream" => m,
                    _ => detect_mime(&bytes, &name).to_string(),
                };
                file = Some(Document::new(bytes, mime).with_name(name));
            }
            "language" => options.language = optional_text(field, "language").await?,
            "documentType" => {
                options.document_type = optional_text(field, "documentType").await?
            }
            _ => {}
        }
    }

    let doc = file.ok_or_else(|| ApiError::BadRequest("No file uploaded".into()))?;
    info!(?doc, "Upload request");
    let outcome = state.processor.process_document(doc, &options, None).await?;
    Ok(Json(outcome.analysis).into_response())
}

/// Text of an optional form field; empty means absent.
async fn optional_text(field: Field<'_>, name: &str) -> Result<Option<String>, ApiError> {
    let text = field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read {name} field: {e}")))?;
    Ok(Some(text).filter(|s| !s.is_empty()))
}

#[derive(Debug, Deserialize)]
struct SaveBody {
    email: Option<String>,
    analysis: Option<Value>,
}

#[derive(Debug, Serialize)]
struct SaveResponse {
    id: String,
    expires_at: String,
    message: &'static str,
}

async fn save(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SaveBody>, JsonRejection>,
) -> Result<Json<SaveResponse>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::internal(SAVE_FAILED_MESSAGE, e.body_text()))?;

    let (email, analysis) = match (body.email, body.analysis) {
        (Some(e), Some(a)) if !e.is_empty() && !a.is_null() => (e, a),
        _ => return Err(ClausewiseError::SaveFieldsRequired.into()),
    };
    if !is_valid_email(&email) {
        return Err(ClausewiseError::InvalidEmail.into());
    }
    let analysis = analysis_from_value(analysis).map_err(|e| {
        ApiError::from(ClausewiseError::InvalidAnalysis {
            detail: e.to_string(),
        })
    })?;

    let record = state
        .store
        .save(&email, &analysis)
        .await
        .map_err(|e| ApiError::internal(SAVE_FAILED_MESSAGE, e.to_string()))?;

    Ok(Json(SaveResponse {
        id: record.id,
        expires_at: record.expires_at.to_rfc3339(),
        message: "Analysis saved successfully",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_mapping() {
        assert!(matches!(
            ApiError::from(ClausewiseError::InvalidEmail),
            ApiError::BadRequest(m) if m == "Invalid email format"
        ));
        assert!(matches!(
            ApiError::from(ClausewiseError::ExtractionFailed),
            ApiError::Unprocessable(_)
        ));
        assert!(matches!(
            ApiError::from(ClausewiseError::Storage("disk full".into())),
            ApiError::Internal { public: INTERNAL_ERROR_MESSAGE, .. }
        ));
    }

    #[test]
    fn internal_error_hides_detail() {
        let resp = ApiError::internal(INTERNAL_ERROR_MESSAGE, "secret stack").into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
