//! Forwarding to a real upstream.
//!
//! # Responsibilities
//! - Rewrite the request URI onto the target base URL
//! - Forward method, non-transport headers and body
//! - Bound each forward by a deadline and the body size limit

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, Uri};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use url::Url;

use crate::config::validation::check_proxy_target;
use crate::config::ConfigError;
use crate::http::request::MockRequest;
use crate::http::response::MockResponse;
use crate::pipeline::PipelineError;

/// Upstream base URL for a proxy route.
#[derive(Debug, Clone)]
pub struct ProxyTarget {
    base: Url,
}

impl ProxyTarget {
    pub fn new(target: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base: check_proxy_target(target)?,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Stands in for the instruction list when deriving cache keys.
    pub fn cache_label(&self) -> String {
        format!("proxy {}", self.base)
    }

    /// `base` with the request's path and query appended.
    pub fn upstream_uri(&self, request: &MockRequest) -> Result<Uri, PipelineError> {
        let base = self.base.as_str().trim_end_matches('/');
        format!("{}{}", base, request.path_and_query())
            .parse()
            .map_err(|e: axum::http::uri::InvalidUri| PipelineError::Upstream(e.to_string()))
    }
}

/// Plain-HTTP client shared by every proxy route.
#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
    max_body_bytes: usize,
}

impl Forwarder {
    pub fn new(timeout: Duration, max_body_bytes: usize) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            client,
            timeout,
            max_body_bytes,
        }
    }

    /// Forward `request` to `target` and buffer the answer.
    pub async fn forward(&self, target: &ProxyTarget, request: &MockRequest) -> Result<MockResponse, PipelineError> {
        let uri = target.upstream_uri(request)?;

        let mut builder = Request::builder().method(request.method().clone()).uri(uri.clone());
        for (name, value) in request.forwardable_headers() {
            builder = builder.header(name, value);
        }
        let outbound = builder
            .body(Body::from(request.body().clone()))
            .map_err(|e| PipelineError::Upstream(e.to_string()))?;

        tracing::debug!(upstream = %uri, "Forwarding request");

        let response = tokio::time::timeout(self.timeout, self.client.request(outbound))
            .await
            .map_err(|_| PipelineError::Timeout)?
            .map_err(|e| {
                tracing::warn!(upstream = %uri, error = %e, "Upstream unreachable");
                PipelineError::Upstream(format!("{} unreachable", target.base()))
            })?;

        let (parts, body) = response.into_parts();
        let content_type = parts
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let body = axum::body::to_bytes(Body::new(body), self.max_body_bytes)
            .await
            .map_err(|e| PipelineError::Upstream(e.to_string()))?;

        Ok(MockResponse::new(parts.status, content_type, body))
    }
}

impl std::fmt::Debug for Forwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Forwarder")
            .field("timeout", &self.timeout)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}
