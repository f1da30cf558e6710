use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::analytics::scan_log_row;
use crate::errors::AppError;
use crate::extract::{Document, DocumentFormat};
use crate::models::analysis::AnalysisResult;
use crate::state::AppState;

/// Multipart field carrying the uploaded resume.
const RESUME_FIELD: &str = "resume";

#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
    pub role: String,
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: String,
}

/// POST /api/v1/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalysisResult>, AppError> {
    let document = read_resume(multipart).await?;

    let outcome = state.pipeline.analyze(&document).await;

    // Analytics must never fail the request.
    if let Err(e) = state.scan_log.record(&scan_log_row(&outcome)).await {
        error!("Scan log error: {e}");
    }

    Ok(Json(outcome?))
}

/// POST /api/v1/summary
pub async fn handle_summary(
    State(state): State<AppState>,
    payload: Result<Json<SummaryRequest>, JsonRejection>,
) -> Result<Json<SummaryResponse>, AppError> {
    let Json(req) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let summary = state.pipeline.summarize(&req.role, &req.skills).await?;
    Ok(Json(SummaryResponse { summary }))
}

/// Pulls the `resume` file out of the form and checks its extension.
async fn read_resume(mut multipart: Multipart) -> Result<Document, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(RESUME_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if filename.is_empty() {
            return Err(AppError::Validation("No file selected".to_string()));
        }
        let format = DocumentFormat::from_filename(&filename)
            .ok_or_else(|| AppError::Validation("Invalid file type".to_string()))?;

        let bytes: Bytes = field.bytes().await.map_err(multipart_error)?;
        return Ok(Document::new(bytes, format));
    }

    Err(AppError::Validation("No file uploaded".to_string()))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::Validation(e.body_text())
    }
}

