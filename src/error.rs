use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Payment not found: {0}")]
    NotFound(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Invalid request: {0}")]
    InvalidArgument(String),

    #[error("Upload rejected: {0}")]
    UploadRejected(String),

    #[error("Status change not allowed: {from} -> {to}")]
    TransitionNotAllowed { from: String, to: String },

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub timestamp: chrono::DateTime<Utc>,
    pub request_id: String,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::InvalidStatus(_) => (StatusCode::BAD_REQUEST, "INVALID_STATUS"),
            AppError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT"),
            AppError::UploadRejected(_) => (StatusCode::BAD_REQUEST, "UPLOAD_REJECTED"),
            AppError::TransitionNotAllowed { .. } => {
                (StatusCode::CONFLICT, "TRANSITION_NOT_ALLOWED")
            }
            AppError::Io(_) | AppError::Serialization(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4().to_string();
        let (status, error_code) = self.status_and_code();

        // Storage details stay in the log, clients get a generic message.
        let error = if status.is_server_error() {
            tracing::error!(
                error = ?self,
                error_code = error_code,
                request_id = %request_id,
                "Request failed"
            );
            "Internal server error".to_string()
        } else {
            tracing::debug!(error = %self, error_code = error_code, "Request rejected");
            self.to_string()
        };

        let body = ErrorResponse {
            success: false,
            error,
            error_code: error_code.to_string(),
            timestamp: Utc::now(),
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        AppError::UploadRejected(err.body_text())
    }
}
