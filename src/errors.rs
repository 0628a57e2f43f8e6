use crate::services::{
    auth_service::AuthError,
    script_workflow::WorkflowError,
    submission_store::StoreError,
    upload_module::UploadError,
    upload_service::SessionError,
};
use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
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
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        let status = match &err {
            UploadError::Files(_) | UploadError::Submission(_) | UploadError::UnknownVideoType(_) => {
                StatusCode::BAD_REQUEST
            }
            UploadError::FileNotFound(_) => StatusCode::NOT_FOUND,
            UploadError::Processing => StatusCode::CONFLICT,
        };
        AppError::new(status, err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SubmissionNotFound(_) | StoreError::FileNotFound { .. } => {
                AppError::not_found(err.to_string())
            }
            StoreError::MissingTargetDate => AppError::bad_request(err.to_string()),
            StoreError::Sqlx(_) | StoreError::Io(_) => AppError::internal(err.to_string()),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::SessionNotFound(_) => AppError::not_found(err.to_string()),
            SessionError::InvalidMaxFiles { .. } => AppError::bad_request(err.to_string()),
            SessionError::Upload(inner) => inner.into(),
            SessionError::Store(inner) => inner.into(),
        }
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        let status = match &err {
            WorkflowError::GenerationInProgress | WorkflowError::InvalidTransition { .. } => {
                StatusCode::CONFLICT
            }
            WorkflowError::Generation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            WorkflowError::Interrupted => StatusCode::INTERNAL_SERVER_ERROR,
        };
        AppError::new(status, err.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        let status = match err {
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::MalformedHeader => StatusCode::BAD_REQUEST,
        };
        AppError::new(status, err.to_string())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::new(err.status(), err.body_text())
    }
}
