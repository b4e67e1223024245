//! Inbound request model.
//!
//! # Responsibilities
//! - Buffer the transport request into a [`MockRequest`]
//! - Produce the canonical description used for cache keys and generation
//! - Assign a UUID v4 request ID when the client did not send one
//!
//! The canonical description is deterministic: equal requests yield equal
//! text regardless of header arrival order or transport headers.

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request, Uri};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Headers that describe the connection rather than the request.
fn is_transport_header(name: &str) -> bool {
    matches!(
        name,
        "connection"
            | "keep-alive"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
            | "host"
            | "content-length"
            | X_REQUEST_ID
    ) || name.starts_with("proxy-")
}

/// A fully buffered inbound request.
#[derive(Debug, Clone)]
pub struct MockRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
}

impl MockRequest {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            method,
            uri,
            headers,
            body: body.into(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Path plus `?query` when present.
    pub fn path_and_query(&self) -> &str {
        self.uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| self.uri.path())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn request_id(&self) -> Option<&str> {
        self.headers.get(X_REQUEST_ID).and_then(|v| v.to_str().ok())
    }

    /// Absolute URL as the client addressed it.
    pub fn full_url(&self) -> String {
        if let (Some(scheme), Some(authority)) = (self.uri.scheme_str(), self.uri.authority()) {
            return format!("{}://{}{}", scheme, authority, self.path_and_query());
        }
        let host = self
            .headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("localhost");
        format!("http://{}{}", host, self.path_and_query())
    }

    /// Request headers minus hop-by-hop and transport headers, sorted by name.
    /// Repeated headers keep their relative order.
    pub fn forwardable_headers(&self) -> Vec<(&HeaderName, &HeaderValue)> {
        let mut headers: Vec<_> = self
            .headers
            .iter()
            .filter(|(name, _)| !is_transport_header(name.as_str()))
            .collect();
        headers.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
        headers
    }

    /// Deterministic text form of the request: method, headers, body, then URL.
    pub fn canonical_description(&self) -> String {
        let mut out = String::new();
        out.push_str("Method: ");
        out.push_str(self.method.as_str());

        let headers = self.forwardable_headers();
        if headers.is_empty() {
            out.push_str("\nHeaders: (none)");
        } else {
            out.push_str("\nHeaders:");
            for (name, value) in headers {
                out.push_str("\n  ");
                out.push_str(name.as_str());
                out.push_str(": ");
                out.push_str(&String::from_utf8_lossy(value.as_bytes()));
            }
        }

        out.push_str("\nBody:\n");
        if self.body.is_empty() {
            out.push_str("(empty)");
        } else {
            out.push_str(&String::from_utf8_lossy(&self.body));
        }

        out.push_str("\nURL: ");
        out.push_str(&self.full_url());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: Method, uri: &str, headers: &[(&'static str, &'static str)], body: &'static str) -> MockRequest {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.append(*name, HeaderValue::from_static(value));
        }
        MockRequest::new(method, uri.parse().unwrap(), map, body)
    }

    #[test]
    fn test_canonical_description_layout() {
        let req = request(
            Method::POST,
            "/api/users?page=2",
            &[("host", "localhost:8080"), ("content-type", "application/json")],
            "{\"name\":\"ann\"}",
        );

        assert_eq!(
            req.canonical_description(),
            "Method: POST\n\
             Headers:\n  content-type: application/json\n\
             Body:\n{\"name\":\"ann\"}\n\
             URL: http://localhost:8080/api/users?page=2"
        );
    }

    #[test]
    fn test_description_ignores_header_order_and_transport_headers() {
        let a = request(
            Method::GET,
            "/x",
            &[
                ("accept", "application/json"),
                ("x-trace", "1"),
                ("connection", "keep-alive"),
                ("x-request-id", "abc"),
            ],
            "",
        );
        let b = request(
            Method::GET,
            "/x",
            &[
                ("x-trace", "1"),
                ("proxy-authorization", "secret"),
                ("accept", "application/json"),
                ("content-length", "0"),
                ("x-request-id", "def"),
            ],
            "",
        );

        assert_eq!(a.canonical_description(), b.canonical_description());
        assert!(!a.canonical_description().contains("keep-alive"));
    }

    #[test]
    fn test_description_is_sensitive_to_request_content() {
        let base = request(Method::GET, "/x", &[], "");
        assert_ne!(
            base.canonical_description(),
            request(Method::GET, "/y", &[], "").canonical_description()
        );
        assert_ne!(
            base.canonical_description(),
            request(Method::POST, "/x", &[], "").canonical_description()
        );
        assert_ne!(
            base.canonical_description(),
            request(Method::GET, "/x", &[], "payload").canonical_description()
        );
    }

    #[test]
    fn test_full_url_fallbacks() {
        let relative = request(Method::GET, "/a?b=1", &[], "");
        assert_eq!(relative.full_url(), "http://localhost/a?b=1");

        let absolute = request(Method::GET, "http://api.test:9000/a", &[], "");
        assert_eq!(absolute.full_url(), "http://api.test:9000/a");
    }

    #[test]
    fn test_make_request_uuid() {
        let req = Request::builder().body(()).unwrap();
        let id = MakeRequestUuid.make_request_id(&req).unwrap();
        let text = id.header_value().to_str().unwrap();
        assert!(Uuid::parse_str(text).is_ok());
    }
}
