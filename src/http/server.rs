//! Mock server: owns the components and the listener.
//!
//! # Responsibilities
//! - Build the pipeline (routes, instructions, cache, backend handler) from config
//! - Expose route, instruction and cache management to the embedding program
//! - Start and stop the axum listener; at most one listener per server
//! - Wire up middleware (request ID, tracing, body limit)
//! - Give every request a cancellation token tied to the server and the client

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::backend::{BackendRequestHandler, GenerationBackend, OpenAiBackend};
use crate::cache::CacheStore;
use crate::config::validation::validate_config;
use crate::config::{ConfigError, MockServerConfig};
use crate::http::request::{MakeRequestUuid, MockRequest, X_REQUEST_ID};
use crate::http::response::MockResponse;
use crate::http::ServerError;
use crate::instructions::{InstructionsContainer, RouteInstruction};
use crate::pipeline::ResponsePipeline;
use crate::routing::{RouteConfiguration, RouteRegistry};
use crate::strategy::{Forwarder, ResponseStrategy};

/// State injected into the catch-all handler.
#[derive(Clone)]
struct AppState {
    pipeline: Arc<ResponsePipeline>,
    shutdown: CancellationToken,
}

struct RunningServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

/// An HTTP server answering every request from its route table.
pub struct MockServer {
    config: MockServerConfig,
    pipeline: Arc<ResponsePipeline>,
    running: Mutex<Option<RunningServer>>,
}

impl MockServer {
    /// Create a server backed by the chat-completions client.
    ///
    /// Fails when no API key is configured.
    pub fn new(config: MockServerConfig) -> Result<Self, ServerError> {
        let backend = OpenAiBackend::from_config(&config)?;
        Self::with_backend(config, Arc::new(backend))
    }

    /// Create a server with a caller-supplied backend.
    pub fn with_backend(config: MockServerConfig, backend: Arc<dyn GenerationBackend>) -> Result<Self, ServerError> {
        config.require_api_key()?;
        validate_config(&config).map_err(ConfigError::Validation)?;

        let instructions = InstructionsContainer::new(config.api_name());
        for instruction in config.instructions() {
            instructions.add_instruction(instruction.clone());
        }
        for definition in config.route_instructions() {
            instructions.add_route_instruction(RouteInstruction::new(
                definition.pattern.clone(),
                definition.method.clone(),
                definition.instructions.clone(),
            ));
        }

        let pipeline = ResponsePipeline::new(
            instructions,
            CacheStore::new(config.cache_directory()),
            config.cache_enabled(),
            BackendRequestHandler::from_config(backend, &config),
            Forwarder::new(
                Duration::from_secs(config.request_timeout_secs()),
                config.max_body_bytes(),
            ),
        );

        for definition in config.routes() {
            let strategy = ResponseStrategy::try_from(&definition.strategy)?;
            pipeline.routes().add(RouteConfiguration::new(
                definition.pattern.clone(),
                definition.method.clone(),
                strategy,
            ));
        }

        tracing::info!(
            api_name = %config.api_name(),
            model = %config.model(),
            routes = pipeline.routes().len(),
            cache_enabled = config.cache_enabled(),
            "Mock server configured"
        );

        Ok(Self {
            config,
            pipeline: Arc::new(pipeline),
            running: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &MockServerConfig {
        &self.config
    }

    // --- routes ---

    /// Append a route. Earlier routes win when several match.
    pub fn add_route(&self, pattern: impl Into<String>, method: impl Into<String>, strategy: ResponseStrategy) {
        self.pipeline
            .routes()
            .add(RouteConfiguration::new(pattern, method, strategy));
    }

    /// Remove the first route with this pattern and method. Returns whether one existed.
    pub fn remove_route(&self, pattern: &str, method: &str) -> bool {
        self.pipeline.routes().remove(pattern, method)
    }

    pub fn clear_routes(&self) {
        self.pipeline.routes().clear();
    }

    pub fn routes(&self) -> &RouteRegistry {
        self.pipeline.routes()
    }

    // --- instructions ---

    pub fn instructions(&self) -> &InstructionsContainer {
        self.pipeline.instructions()
    }

    pub fn add_instruction(&self, instruction: impl Into<String>) {
        self.pipeline.instructions().add_instruction(instruction);
    }

    pub fn clear_instructions(&self) {
        self.pipeline.instructions().clear_instructions();
    }

    pub fn add_route_instruction(&self, route_instruction: RouteInstruction) {
        self.pipeline.instructions().add_route_instruction(route_instruction);
    }

    // --- cache ---

    pub fn cache(&self) -> &CacheStore {
        self.pipeline.cache()
    }

    /// Delete all cached responses. Returns the number of files removed.
    pub async fn clear_cache(&self) -> usize {
        let removed = self.pipeline.cache().clear().await;
        tracing::info!(removed, "Cache cleared");
        removed
    }

    // --- lifecycle ---

    /// Bind and start serving in the background. Returns the bound address.
    pub async fn start(&self) -> Result<SocketAddr, ServerError> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Err(ServerError::AlreadyRunning);
        }

        let host = self.config.bind_host();
        let port = self.config.port();
        let bind_error = |source| ServerError::Bind {
            address: format!("{}:{}", host, port),
            source,
        };
        let listener = TcpListener::bind((host, port)).await.map_err(bind_error)?;
        let addr = listener.local_addr().map_err(bind_error)?;

        let shutdown = CancellationToken::new();
        let app = self.build_router(shutdown.clone());
        let signal = shutdown.clone().cancelled_owned();

        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(signal).await {
                tracing::error!(error = %e, "Mock server terminated");
            }
        });

        tracing::info!(address = %addr, "Mock server listening");
        *running = Some(RunningServer { addr, shutdown, task });
        Ok(addr)
    }

    /// Stop serving and wait for in-flight requests to finish. No-op when stopped.
    pub async fn stop(&self) {
        let mut running = self.running.lock().await;
        let Some(server) = running.take() else {
            return;
        };

        server.shutdown.cancel();
        if let Err(e) = server.task.await {
            tracing::warn!(error = %e, "Mock server task ended abnormally");
        }
        tracing::info!(address = %server.addr, "Mock server stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().await.as_ref().map(|s| s.addr)
    }

    /// `http://addr` of the running listener.
    pub async fn base_url(&self) -> Option<String> {
        self.local_addr().await.map(|addr| format!("http://{}", addr))
    }

    /// The axum router for this server, for serving on a caller-owned listener.
    /// Requests are cancelled when `shutdown` fires.
    pub fn router(&self, shutdown: CancellationToken) -> Router {
        self.build_router(shutdown)
    }

    fn build_router(&self, shutdown: CancellationToken) -> Router {
        let state = AppState {
            pipeline: self.pipeline.clone(),
            shutdown,
        };
        let request_id = HeaderName::from_static(X_REQUEST_ID);

        Router::new()
            .route("/", any(mock_handler))
            .route("/{*path}", any(mock_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        let request_id = request
                            .headers()
                            .get(X_REQUEST_ID)
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or("unknown");
                        tracing::info_span!(
                            "request",
                            request_id = %request_id,
                            method = %request.method(),
                            path = %request.uri().path(),
                        )
                    }))
                    .layer(PropagateRequestIdLayer::new(request_id))
                    .layer(RequestBodyLimitLayer::new(self.config.max_body_bytes())),
            )
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Ok(running) = self.running.try_lock() {
            if let Some(server) = running.as_ref() {
                server.shutdown.cancel();
            }
        }
    }
}

impl std::fmt::Debug for MockServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockServer")
            .field("config", &self.config)
            .field("routes", &self.pipeline.routes().len())
            .finish()
    }
}

/// Catch-all handler: buffer the request and hand it to the pipeline.
async fn mock_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read request body");
            return MockResponse::json_error(StatusCode::BAD_REQUEST, "Failed to read request body")
                .into_response();
        }
    };
    let request = MockRequest::new(parts.method, parts.uri, parts.headers, body);

    // Cancelled on server stop, or when this future is dropped because the client left.
    let cancel = state.shutdown.child_token();
    let _guard = cancel.clone().drop_guard();

    state.pipeline.handle(&request, &cancel).await.into_response()
}
