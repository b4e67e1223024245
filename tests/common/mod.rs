//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ai_mock_server::{BackendError, GenerationBackend, MockServer, MockServerConfig, Turn};
use async_trait::async_trait;
use axum::Router;
use tokio::net::TcpListener;

/// Backend stub: plays back queued replies, then repeats a default reply.
pub struct StubBackend {
    queued: Mutex<VecDeque<Result<String, BackendError>>>,
    fallback: Result<String, BackendError>,
    delay: Duration,
    calls: AtomicUsize,
    last_turns: Mutex<Vec<Turn>>,
}

impl StubBackend {
    pub fn replying(body: &str) -> Arc<Self> {
        Self::build(Vec::new(), Ok(body.to_string()), Duration::ZERO)
    }

    pub fn failing(error: BackendError) -> Arc<Self> {
        Self::build(Vec::new(), Err(error), Duration::ZERO)
    }

    pub fn scripted(queued: Vec<Result<String, BackendError>>, then: &str) -> Arc<Self> {
        Self::build(queued, Ok(then.to_string()), Duration::ZERO)
    }

    pub fn slow(body: &str, delay: Duration) -> Arc<Self> {
        Self::build(Vec::new(), Ok(body.to_string()), delay)
    }

    fn build(
        queued: Vec<Result<String, BackendError>>,
        fallback: Result<String, BackendError>,
        delay: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            queued: Mutex::new(queued.into()),
            fallback,
            delay,
            calls: AtomicUsize::new(0),
            last_turns: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_turns(&self) -> Vec<Turn> {
        self.last_turns.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationBackend for StubBackend {
    async fn generate(&self, turns: &[Turn], _model: &str) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_turns.lock().unwrap() = turns.to_vec();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let queued = self.queued.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| self.fallback.clone())
    }
}

/// Config with a dummy key, the cache under `cache_dir`, and fast failure.
pub fn test_config(cache_dir: &Path) -> MockServerConfig {
    let mut config = MockServerConfig::new("sk-test");
    config.set_cache_directory(cache_dir);
    config.set_max_retries(0).unwrap();
    config.set_initial_retry_delay_ms(100).unwrap();
    config.set_max_retry_delay_ms(1000).unwrap();
    config
}

/// Build and start a server on an ephemeral port. Returns it with its base URL.
pub async fn start_server(config: MockServerConfig, backend: Arc<StubBackend>) -> (MockServer, String) {
    let server = MockServer::with_backend(config, backend).unwrap();
    let addr = server.start().await.unwrap();
    (server, format!("http://{}", addr))
}

/// Serve `app` on an ephemeral port.
pub async fn spawn_upstream(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Client without connection pooling so a stopped server is seen immediately.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
