use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::error::AnalysisError;
use crate::llm_client::GenerationFailure;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, detail) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                None,
            ),
            AppError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                "Uploaded file is too large".to_string(),
                None,
            ),
            AppError::Analysis(err) => analysis_parts(err),
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(detail) = detail {
            error["detail"] = json!(detail);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

fn analysis_parts(err: &AnalysisError) -> (StatusCode, &'static str, String, Option<String>) {
    match err {
        AnalysisError::EmptyExtraction | AnalysisError::InvalidInput(_) => {
            (StatusCode::BAD_REQUEST, err.code(), err.to_string(), None)
        }
        AnalysisError::Generation(GenerationFailure::CredentialMissing) => {
            tracing::error!("Generation service credential is not configured");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                err.code(),
                "AI analysis is not configured".to_string(),
                None,
            )
        }
        AnalysisError::Generation(_) | AnalysisError::ResponseParse { .. } => {
            tracing::error!("AI analysis failed: {err}");
            (
                StatusCode::BAD_GATEWAY,
                err.code(),
                "An AI processing error occurred".to_string(),
                err.diagnostic(),
            )
        }
    }
}
