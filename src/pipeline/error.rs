//! Pipeline failures and their HTTP status mapping.

use axum::http::StatusCode;
use thiserror::Error;

use crate::backend::BackendError;
use crate::http::response::{MockResponse, CLIENT_CLOSED_REQUEST};

/// Why a request could not be answered by its strategy.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No route configured for {method} {path}")]
    NoRoute { method: String, path: String },

    /// The backend failed permanently or ran out of retries.
    #[error("Response generation failed: {0}")]
    Generation(BackendError),

    /// The backend answered with nothing usable.
    #[error("Generated content is invalid: {0}")]
    InvalidContent(String),

    #[error("Upstream request failed: {0}")]
    Upstream(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Request cancelled by client")]
    Cancelled,

    #[error("Response file unavailable: {0}")]
    File(String),
}

impl PipelineError {
    pub fn status(&self) -> StatusCode {
        match self {
            PipelineError::NoRoute { .. } => StatusCode::NOT_FOUND,
            PipelineError::InvalidContent(_) | PipelineError::File(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PipelineError::Generation(_) | PipelineError::Upstream(_) => StatusCode::BAD_GATEWAY,
            PipelineError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            PipelineError::Cancelled => {
                StatusCode::from_u16(CLIENT_CLOSED_REQUEST).unwrap_or(StatusCode::BAD_REQUEST)
            }
        }
    }

    /// Render as the JSON error envelope.
    pub fn to_response(&self) -> MockResponse {
        MockResponse::json_error(self.status(), self.to_string())
    }
}

impl From<BackendError> for PipelineError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::EmptyContent => PipelineError::InvalidContent(err.to_string()),
            BackendError::Timeout(_) => PipelineError::Timeout,
            BackendError::Cancelled => PipelineError::Cancelled,
            other => PipelineError::Generation(other),
        }
    }
}
