//! Startup orchestration for the binary.
//!
//! # Responsibilities
//! - Install logging and, when configured, the metrics exporter
//! - Build the server from a validated config and start it
//! - Serve until a shutdown signal, then stop gracefully
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener starts last (traffic only when ready)

use std::net::SocketAddr;

use crate::config::MockServerConfig;
use crate::http::{MockServer, ServerError};
use crate::lifecycle::signals::shutdown_signal;
use crate::observability::{logging, metrics};

/// Run a server for `config` until SIGINT/SIGTERM.
pub async fn run(config: MockServerConfig) -> Result<(), ServerError> {
    logging::init(config.log_level());

    if let Some(address) = config.metrics_address() {
        match address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(metrics_address = %address, error = %e, "Failed to parse metrics address"),
        }
    }

    tracing::info!(
        bind_host = %config.bind_host(),
        port = config.port(),
        max_concurrent_requests = config.max_concurrent_requests(),
        max_retries = config.max_retries(),
        "Configuration loaded"
    );

    let server = MockServer::new(config)?;
    let addr = server.start().await?;
    tracing::info!(url = %format!("http://{}", addr), "Ready");

    shutdown_signal().await;

    server.stop().await;
    tracing::info!("Shutdown complete");
    Ok(())
}
