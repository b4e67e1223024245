//! File-backed responses.

use std::path::PathBuf;

use axum::http::StatusCode;
use tokio::fs;

use crate::http::response::{MockResponse, APPLICATION_JSON};
use crate::pipeline::PipelineError;

/// Serves the current contents of a file.
#[derive(Debug, Clone)]
pub struct FileResponse {
    pub path: PathBuf,
    pub status: StatusCode,
    pub content_type: String,
}

impl FileResponse {
    /// 200 `application/json` from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            status: StatusCode::OK,
            content_type: APPLICATION_JSON.to_string(),
        }
    }

    /// Read the file now. Edits on disk show up on the next request.
    pub async fn render(&self) -> Result<MockResponse, PipelineError> {
        let body = fs::read(&self.path).await.map_err(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "Response file unreadable");
            PipelineError::File(self.path.display().to_string())
        })?;
        Ok(MockResponse::new(self.status, self.content_type.clone(), body))
    }
}
