//! Outbound response model and the JSON error envelope.

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

pub const APPLICATION_JSON: &str = "application/json";

/// Non-standard status for a request the client abandoned.
pub const CLIENT_CLOSED_REQUEST: u16 = 499;

/// Body of every error response: `{"error": "...", "status": 404}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
    pub status: u16,
}

/// A response produced by a strategy, before it reaches the transport.
#[derive(Debug, Clone)]
pub struct MockResponse {
    status: StatusCode,
    content_type: String,
    body: Bytes,
}

impl MockResponse {
    pub fn new(status: StatusCode, content_type: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            body: body.into(),
        }
    }

    /// Error envelope with `status` mirrored in the body.
    pub fn json_error(status: StatusCode, message: impl Into<String>) -> Self {
        let envelope = ErrorEnvelope {
            error: message.into(),
            status: status.as_u16(),
        };
        // Two plain fields cannot fail to serialize.
        let body = serde_json::to_vec(&envelope).unwrap_or_default();
        Self::new(status, APPLICATION_JSON, body)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

impl IntoResponse for MockResponse {
    fn into_response(self) -> Response {
        let content_type = HeaderValue::from_str(&self.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        response.headers_mut().insert(header::CONTENT_TYPE, content_type);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_envelope() {
        let response = MockResponse::json_error(StatusCode::NOT_FOUND, "No route configured for GET /x");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.content_type(), APPLICATION_JSON);

        let envelope: ErrorEnvelope = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(envelope.status, 404);
        assert_eq!(envelope.error, "No route configured for GET /x");
    }

    #[test]
    fn test_client_closed_status() {
        let status = StatusCode::from_u16(CLIENT_CLOSED_REQUEST).unwrap();
        let response = MockResponse::json_error(status, "cancelled").into_response();
        assert_eq!(response.status().as_u16(), 499);
    }

    #[test]
    fn test_into_response_sets_content_type() {
        let response = MockResponse::new(StatusCode::CREATED, "text/plain", "hi").into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
    }
}
