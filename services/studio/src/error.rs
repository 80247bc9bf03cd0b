//! Custom error types for the studio service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::thumbnail::CaptureError;
use crate::validation::ValidationError;

/// Custom error type for the studio service
#[derive(Error, Debug)]
pub enum StudioError {
    /// No authenticated session is available
    #[error("Not authenticated")]
    Unauthenticated,

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The backend answered `success: false`
    #[error("{0}")]
    Backend(String),

    /// A user-supplied value was rejected
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A frame could not be captured as a thumbnail
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] common::error::StoreError),

    /// A report could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An edit action was requested while no edit session is open
    #[error("No video is being edited")]
    NoActiveSession,

    /// A locally persisted record does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for StudioError {
    fn into_response(self) -> Response {
        let status = match &self {
            StudioError::Unauthenticated => StatusCode::UNAUTHORIZED,
            StudioError::Validation(_) | StudioError::Capture(_) => StatusCode::BAD_REQUEST,
            StudioError::NoActiveSession => StatusCode::CONFLICT,
            StudioError::NotFound(_) => StatusCode::NOT_FOUND,
            StudioError::Http(_)
            | StudioError::UnexpectedStatus { .. }
            | StudioError::Backend(_) => StatusCode::BAD_GATEWAY,
            StudioError::Store(_) | StudioError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Type alias for studio results
pub type StudioResult<T> = Result<T, StudioError>;
