use crate::{
    models::api_response::{
        ApiResponse, CODE_GENERAL_ERROR, CODE_INVALID_KEY, CODE_INVALID_PAYLOAD, CODE_NOT_FOUND,
        CODE_PARSING_REQUEST, CODE_VALIDATION_ERROR, ValidationError,
    },
    services::{storage_service::StorageError, upload_service::UploadError},
};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

/// An HTTP-facing error rendered as an [`ApiResponse`] envelope.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub errors: Option<Vec<ValidationError>>,
}

impl AppError {
    /// Create a new AppError with a specific status, code and message.
    pub fn new(status: StatusCode, code: &'static str, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: msg.into(),
            errors: None,
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, CODE_GENERAL_ERROR, msg)
    }

    /// 400 for a body that could not be parsed at all.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, CODE_PARSING_REQUEST, msg)
    }

    /// 400 carrying the translated field errors.
    pub fn validation(errors: Vec<ValidationError>) -> Self {
        Self {
            errors: Some(errors),
            ..Self::new(
                StatusCode::BAD_REQUEST,
                CODE_VALIDATION_ERROR,
                "Validation failed",
            )
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body: ApiResponse = ApiResponse::failure(self.code, self.message, self.errors);
        (self.status, Json(body)).into_response()
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Payload(err) => Self::new(
                StatusCode::BAD_REQUEST,
                CODE_INVALID_PAYLOAD,
                format!("Invalid document_base64: {err}"),
            ),
            UploadError::Storage(err) => err.into(),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ObjectNotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, CODE_NOT_FOUND, "Document not found")
            }
            StorageError::InvalidObjectKey => Self::new(
                StatusCode::BAD_REQUEST,
                CODE_INVALID_KEY,
                "Invalid document key or name",
            ),
            StorageError::InvalidBucketName { .. }
            | StorageError::Sqlx(_)
            | StorageError::Io(_) => Self::internal("Failed to process document"),
        }
    }
}
