//! Text-generation backend subsystem.
//!
//! # Data Flow
//! ```text
//! Vec<Turn> (instruction turns + one request turn)
//!     → handler.rs (admission gate, retry loop, cancellation)
//!     → GenerationBackend impl (openai.rs in production, stubs in tests)
//!     → generated text or classified BackendError
//! ```

pub mod error;
pub mod handler;
pub mod openai;

pub use error::BackendError;
pub use handler::{BackendRequestHandler, RetrySettings};
pub use openai::OpenAiBackend;

use async_trait::async_trait;

/// Role of a turn in a backend invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    /// Steers how the response is produced.
    Instruction,
    /// The canonical description of the inbound request.
    Request,
}

/// One message submitted to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
}

impl Turn {
    pub fn instruction(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Instruction,
            content: content.into(),
        }
    }

    pub fn request(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Request,
            content: content.into(),
        }
    }
}

/// Build the turns for one invocation: one per instruction, then the request.
pub fn build_turns(instructions: &[String], request_description: &str) -> Vec<Turn> {
    instructions
        .iter()
        .map(Turn::instruction)
        .chain(std::iter::once(Turn::request(request_description)))
        .collect()
}

/// An external service that turns instructions and a request into text.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Produce text for the ordered `turns` using `model`.
    async fn generate(&self, turns: &[Turn], model: &str) -> Result<String, BackendError>;
}
