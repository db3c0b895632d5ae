use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use konspekt_core::{KonspektError, Processor, ResultEnvelope};

/// Shared state injected into every handler.
pub struct AppState {
    pub processor: Processor,
    pub model: String,
    pub api_key_configured: bool,
    pub production: bool,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/health", get(health))
        .route("/api/process", post(process_video))
        .route("/api/process-youtube", post(process_video))
        .route("/api/process-transcript", post(process_transcript))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessVideoRequest {
    pub video_url: String,
}

#[derive(Debug, Deserialize)]
pub struct ProcessTranscriptRequest {
    pub transcript: String,
}

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub success: bool,
    pub data: ResultEnvelope,
    pub cached: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub api_key_configured: bool,
    pub model: String,
    pub cache_entries: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
        api_key_configured: state.api_key_configured,
        model: state.model.clone(),
        cache_entries: state.processor.cache().len(),
    })
}

async fn process_video(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProcessVideoRequest>,
) -> Result<Json<ProcessResponse>, ApiError> {
    let outcome = state
        .processor
        .process_video(&req.video_url)
        .await
        .map_err(|e| ApiError::from_core(e, state.production))?;
    Ok(Json(ProcessResponse {
        success: true,
        data: outcome.envelope,
        cached: outcome.cached,
    }))
}

async fn process_transcript(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProcessTranscriptRequest>,
) -> Result<Json<ProcessResponse>, ApiError> {
    let outcome = state
        .processor
        .process_pasted(&req.transcript)
        .await
        .map_err(|e| ApiError::from_core(e, state.production))?;
    Ok(Json(ProcessResponse {
        success: true,
        data: outcome.envelope,
        cached: outcome.cached,
    }))
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    details: Option<String>,
}

impl ApiError {
    fn from_core(err: KonspektError, production: bool) -> Self {
        let status = status_for(&err);
        if status.is_server_error() {
            warn!(%err, "request failed");
        }
        Self {
            status,
            message: public_message(&err, production),
            details: (!production).then(|| err.to_string()),
        }
    }

    #[cfg(test)]
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = serde_json::json!({
            "success": false,
            "error": self.message,
        });
        if let Some(details) = self.details {
            body["details"] = details.into();
        }
        (self.status, Json(body)).into_response()
    }
}

fn status_for(err: &KonspektError) -> StatusCode {
    match err {
        KonspektError::Validation { .. } => StatusCode::BAD_REQUEST,
        KonspektError::CaptionsDisabled { .. } | KonspektError::TranscriptNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        KonspektError::ProviderQuota { .. } => StatusCode::TOO_MANY_REQUESTS,
        KonspektError::ProviderUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// User-facing message per error kind. Client-fault kinds keep their
/// actionable message; internal kinds are replaced with a generic one in
/// production mode.
fn public_message(err: &KonspektError, production: bool) -> String {
    match err {
        KonspektError::Validation { .. }
        | KonspektError::CaptionsDisabled { .. }
        | KonspektError::TranscriptNotFound { .. }
        | KonspektError::TranscriptFetchFailed { .. }
        | KonspektError::ProviderQuota { .. }
        | KonspektError::ProviderUnavailable { .. } => err.to_string(),
        _ if production => "Processing failed, please try again later".to_string(),
        _ => err.to_string(),
    }
}
