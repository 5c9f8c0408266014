//! API error types with IntoResponse
//!
//! Every failure renders as `{success: false, error, details?}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use birthorder_core::{ExportError, ValidationError};
use serde_json::json;

use crate::store::StoreError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Submission failed validation (400)
    Validation(ValidationError),

    /// Body could not be parsed at all (400)
    BadRequest { message: String },

    /// Lookup matched nothing (404)
    NotFound { message: String },

    /// Nothing stored to export (404)
    NoData,

    /// Storage failure (500, logged)
    Storage(StoreError),

    /// Request exceeded the configured timeout (408)
    Timeout,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Validation(e) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "success": false,
                    "error": e.summary(),
                    "details": e.details(),
                }),
            ),
            Self::BadRequest { message } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "success": false,
                    "error": message,
                }),
            ),
            Self::NotFound { message } => (
                StatusCode::NOT_FOUND,
                json!({
                    "success": false,
                    "error": message,
                }),
            ),
            Self::NoData => (
                StatusCode::NOT_FOUND,
                json!({
                    "success": false,
                    "error": ExportError::NoData.to_string(),
                }),
            ),
            Self::Storage(e) => {
                // Log the actual error, return generic message
                tracing::error!(error = %e, "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "success": false,
                        "error": "Database error",
                    }),
                )
            }
            Self::Timeout => (
                StatusCode::REQUEST_TIMEOUT,
                json!({
                    "success": false,
                    "error": "Request timed out",
                }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self::Storage(e)
    }
}

impl From<ExportError> for ApiError {
    fn from(e: ExportError) -> Self {
        match e {
            ExportError::NoData => Self::NoData,
        }
    }
}
