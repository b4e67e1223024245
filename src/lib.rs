//! AI-backed mock API server library.
//!
//! Embed a [`MockServer`], register routes with a [`ResponseStrategy`],
//! and point a client at [`MockServer::start`]'s address.

pub mod backend;
pub mod cache;
pub mod config;
pub mod http;
pub mod instructions;
pub mod pipeline;
pub mod routing;
pub mod strategy;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use backend::{BackendError, GenerationBackend, Turn};
pub use config::MockServerConfig;
pub use http::{MockServer, ServerError};
pub use instructions::{InstructionsContainer, RouteInstruction};
pub use strategy::ResponseStrategy;
