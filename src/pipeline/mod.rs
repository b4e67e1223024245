//! Response generation pipeline.
//!
//! # State Machine
//! ```text
//! Resolve ──no route──▶ 404 envelope
//!    │
//!    ▼
//! Dispatch ──▶ Static | File | Proxy | Generate ──▶ Respond
//! ```
//!
//! # Generate
//! ```text
//! MockRequest
//!     → canonical description + instructions for (path, method)
//!     → cache key ──hit──▶ cached body
//!     → miss: turns → BackendRequestHandler → clean + validate
//!     → persist (failure logged, response still served)
//! ```

pub mod error;
pub mod generate;

pub use error::PipelineError;

use std::time::Instant;

use axum::http::StatusCode;
use tokio_util::sync::CancellationToken;

use crate::backend::{build_turns, BackendRequestHandler};
use crate::cache::CacheStore;
use crate::http::request::MockRequest;
use crate::http::response::{MockResponse, APPLICATION_JSON};
use crate::instructions::InstructionsContainer;
use crate::observability::metrics;
use crate::routing::{RouteConfiguration, RouteRegistry};
use crate::strategy::{is_json_content_type, Forwarder, GeneratedResponse, ProxyTarget, ResponseStrategy};

use self::generate::{clean_generated, validate_generated};

/// Turns an inbound request into a response. One per server.
#[derive(Debug)]
pub struct ResponsePipeline {
    routes: RouteRegistry,
    instructions: InstructionsContainer,
    cache: CacheStore,
    cache_enabled: bool,
    handler: BackendRequestHandler,
    forwarder: Forwarder,
}

impl ResponsePipeline {
    pub fn new(
        instructions: InstructionsContainer,
        cache: CacheStore,
        cache_enabled: bool,
        handler: BackendRequestHandler,
        forwarder: Forwarder,
    ) -> Self {
        Self {
            routes: RouteRegistry::new(),
            instructions,
            cache,
            cache_enabled,
            handler,
            forwarder,
        }
    }

    pub fn routes(&self) -> &RouteRegistry {
        &self.routes
    }

    pub fn instructions(&self) -> &InstructionsContainer {
        &self.instructions
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    pub fn handler(&self) -> &BackendRequestHandler {
        &self.handler
    }

    /// Produce the response for `request`. Failures become error envelopes.
    pub async fn handle(&self, request: &MockRequest, cancel: &CancellationToken) -> MockResponse {
        let start = Instant::now();
        let method = request.method().as_str();
        let request_id = request.request_id().unwrap_or("unknown");

        let (kind, result) = match self.routes.match_route(request.path(), method) {
            Some(route) => (route.strategy().kind(), self.dispatch(&route, request, cancel).await),
            None => (
                "none",
                Err(PipelineError::NoRoute {
                    method: method.to_string(),
                    path: request.path().to_string(),
                }),
            ),
        };

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                match &e {
                    PipelineError::NoRoute { .. } | PipelineError::Cancelled => {
                        tracing::debug!(request_id = %request_id, error = %e, "Request not served")
                    }
                    _ => tracing::warn!(request_id = %request_id, strategy = kind, error = %e, "Request failed"),
                }
                e.to_response()
            }
        };

        tracing::debug!(
            request_id = %request_id,
            method = %method,
            path = %request.path(),
            strategy = kind,
            status = response.status().as_u16(),
            "Request handled"
        );
        metrics::record_request(method, response.status().as_u16(), kind, start);
        response
    }

    async fn dispatch(
        &self,
        route: &RouteConfiguration,
        request: &MockRequest,
        cancel: &CancellationToken,
    ) -> Result<MockResponse, PipelineError> {
        match route.strategy() {
            ResponseStrategy::Static(s) => Ok(MockResponse::new(s.status, s.content_type.clone(), s.body.clone())),
            ResponseStrategy::File(file) => file.render().await,
            ResponseStrategy::Proxy(target) => self.proxy(target, request, cancel).await,
            ResponseStrategy::Generated(generated) => self.generate(generated, request, cancel).await,
        }
    }

    async fn generate(
        &self,
        generated: &GeneratedResponse,
        request: &MockRequest,
        cancel: &CancellationToken,
    ) -> Result<MockResponse, PipelineError> {
        let description = request.canonical_description();
        let instructions = self
            .instructions
            .instructions_for_request(request.path(), request.method().as_str());
        let key = self.cache.derive_key(&instructions, &description);

        if self.cache_enabled {
            if let Some(body) = self.cache.get(&key).await {
                tracing::debug!(key = %key.short(), "Serving cached response");
                return Ok(MockResponse::new(StatusCode::OK, generated.content_type.clone(), body));
            }
        }

        let turns = build_turns(&instructions, &description);
        let raw = self.handler.invoke(&turns, cancel).await?;

        let body = clean_generated(&raw);
        validate_generated(&body, &generated.content_type)?;

        if self.cache_enabled {
            if let Err(e) = self.cache.put(&key, &body, &description, &instructions).await {
                tracing::warn!(key = %key.short(), error = %e, "Failed to persist generated response");
            }
        }

        Ok(MockResponse::new(StatusCode::OK, generated.content_type.clone(), body))
    }

    async fn proxy(
        &self,
        target: &ProxyTarget,
        request: &MockRequest,
        cancel: &CancellationToken,
    ) -> Result<MockResponse, PipelineError> {
        let description = request.canonical_description();
        let label = [target.cache_label()];
        let key = self.cache.derive_key(&label, &description);

        if self.cache_enabled {
            if let Some(body) = self.cache.get(&key).await {
                tracing::debug!(key = %key.short(), "Serving cached upstream response");
                return Ok(MockResponse::new(StatusCode::OK, APPLICATION_JSON, body));
            }
        }

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            response = self.forwarder.forward(target, request) => response?,
        };

        // Replays are served as 200 application/json, so only persist what they reproduce.
        if self.cache_enabled
            && response.status() == StatusCode::OK
            && is_json_content_type(response.content_type())
        {
            match std::str::from_utf8(response.body()) {
                Ok(body) => {
                    if let Err(e) = self.cache.put(&key, body, &description, &label).await {
                        tracing::warn!(key = %key.short(), error = %e, "Failed to persist upstream response");
                    }
                }
                Err(_) => tracing::debug!(key = %key.short(), "Upstream body is not UTF-8, not cached"),
            }
        }

        Ok(response)
    }
}
