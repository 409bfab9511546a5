//! HTTP error type for the axum handlers.
//!
//! Each variant maps to exactly one status code. The body is always JSON,
//! `{"error": "<message>"}`, carrying the underlying error text.

use crate::error::Pdf2ImgError;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed upload or form field.
    #[error("{0}")]
    Validation(String),

    /// Unknown session or page index.
    #[error("{0}")]
    NotFound(String),

    /// The multipart body could not be read (too large, truncated, ...).
    #[error("{0}")]
    Multipart(#[from] MultipartError),

    /// Rasterisation failed.
    #[error("Conversion failed: {0}")]
    Render(#[source] Pdf2ImgError),

    /// Packaging pages into a ZIP failed.
    #[error("{0}")]
    Archive(#[source] Pdf2ImgError),

    /// Anything else that went wrong on our side.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Multipart(e) => e.status(),
            ApiError::Render(_) | ApiError::Archive(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<Pdf2ImgError> for ApiError {
    fn from(e: Pdf2ImgError) -> Self {
        match e {
            Pdf2ImgError::ArchiveFailed(_) => ApiError::Archive(e),
            other => ApiError::Render(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Multipart(e) => e.body_text(),
            other => other.to_string(),
        };

        if status.is_server_error() {
            match &self {
                ApiError::Render(e) if e.is_document_error() => {
                    warn!("Rejected document: {}", message)
                }
                _ => error!("Request failed ({}): {}", status, message),
            }
        }

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
