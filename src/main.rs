//! ai-mock-server
//!
//! Serves a mock HTTP API whose responses come from static bodies, files,
//! a real upstream, or a text-generation backend steered by instructions.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                 MOCK SERVER                  │
//!     Client Request      │  ┌────────┐   ┌──────────┐   ┌────────────┐  │
//!     ────────────────────┼─▶│  http  │──▶│ routing  │──▶│  strategy  │  │
//!                         │  │ server │   │ registry │   │  dispatch  │  │
//!                         │  └────────┘   └──────────┘   └─────┬──────┘  │
//!                         │                                    │         │
//!                         │          ┌─────────────────────────┼──────┐  │
//!                         │          ▼             ▼           ▼      │  │
//!                         │  ┌──────────────┐ ┌────────┐ ┌──────────┐ │  │
//!                         │  │ instructions │ │ cache  │ │ backend  │─┼──┼──▶ LLM API
//!                         │  └──────────────┘ └────────┘ │ handler  │ │  │
//!                         │                              └──────────┘ │  │
//!                         │  config · observability · resilience ·    │  │
//!                         │  lifecycle                                │  │
//!                         └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use ai_mock_server::config::loader::{load_config, parse_config, API_KEY_ENV};
use ai_mock_server::lifecycle;

#[derive(Parser)]
#[command(name = "ai-mock-server")]
#[command(about = "Mock HTTP API server backed by a text-generation model", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen port (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => parse_config("", std::env::var(API_KEY_ENV).ok())?,
    };
    if let Some(port) = cli.port {
        config.set_port(port);
    }

    lifecycle::run(config).await?;
    Ok(())
}
