//! Response strategies.
//!
//! Each route owns exactly one strategy deciding how its responses are made:
//!
//! | Strategy    | Source                                 |
//! |-------------|----------------------------------------|
//! | `Static`    | a canned body held in memory           |
//! | `File`      | a file re-read on every request        |
//! | `Proxy`     | a real upstream, cached after success  |
//! | `Generated` | the text-generation backend            |

pub mod file;
pub mod proxy;

pub use file::FileResponse;
pub use proxy::{Forwarder, ProxyTarget};

use axum::body::Bytes;
use axum::http::StatusCode;

use crate::config::{ConfigError, StrategyDefinition};
use crate::http::response::APPLICATION_JSON;

/// A canned response.
#[derive(Debug, Clone)]
pub struct StaticResponse {
    pub status: StatusCode,
    pub content_type: String,
    pub body: Bytes,
}

/// Marker for backend-generated responses.
#[derive(Debug, Clone)]
pub struct GeneratedResponse {
    pub content_type: String,
}

/// How a route produces its response.
#[derive(Debug, Clone)]
pub enum ResponseStrategy {
    Static(StaticResponse),
    File(FileResponse),
    Proxy(ProxyTarget),
    Generated(GeneratedResponse),
}

impl ResponseStrategy {
    pub fn static_response(status: StatusCode, content_type: impl Into<String>, body: impl Into<Bytes>) -> Self {
        ResponseStrategy::Static(StaticResponse {
            status,
            content_type: content_type.into(),
            body: body.into(),
        })
    }

    /// 200 with a JSON body.
    pub fn static_json(body: impl Into<Bytes>) -> Self {
        Self::static_response(StatusCode::OK, APPLICATION_JSON, body)
    }

    /// 200 with a plain-text body.
    pub fn static_text(body: impl Into<Bytes>) -> Self {
        Self::static_response(StatusCode::OK, "text/plain; charset=utf-8", body)
    }

    pub fn file(path: impl Into<std::path::PathBuf>) -> Self {
        ResponseStrategy::File(FileResponse::new(path))
    }

    pub fn proxy(target: &str) -> Result<Self, ConfigError> {
        Ok(ResponseStrategy::Proxy(ProxyTarget::new(target)?))
    }

    /// Generated JSON.
    pub fn generated() -> Self {
        Self::generated_as(APPLICATION_JSON)
    }

    pub fn generated_as(content_type: impl Into<String>) -> Self {
        ResponseStrategy::Generated(GeneratedResponse {
            content_type: content_type.into(),
        })
    }

    /// Short name used in logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            ResponseStrategy::Static(_) => "static",
            ResponseStrategy::File(_) => "file",
            ResponseStrategy::Proxy(_) => "proxy",
            ResponseStrategy::Generated(_) => "generated",
        }
    }
}

fn status_code(status: u16) -> Result<StatusCode, ConfigError> {
    StatusCode::from_u16(status).map_err(|_| ConfigError::OutOfRange {
        field: "status",
        value: status.to_string(),
        min: "100".to_string(),
        max: "999".to_string(),
    })
}

impl TryFrom<&StrategyDefinition> for ResponseStrategy {
    type Error = ConfigError;

    fn try_from(definition: &StrategyDefinition) -> Result<Self, Self::Error> {
        match definition {
            StrategyDefinition::Static {
                status,
                content_type,
                body,
            } => Ok(Self::static_response(
                status_code(*status)?,
                content_type.clone(),
                body.clone(),
            )),
            StrategyDefinition::File {
                path,
                status,
                content_type,
            } => Ok(ResponseStrategy::File(FileResponse {
                path: path.clone(),
                status: status_code(*status)?,
                content_type: content_type.clone(),
            })),
            StrategyDefinition::Proxy { target } => Self::proxy(target),
            StrategyDefinition::Generated { content_type } => Ok(Self::generated_as(content_type.clone())),
        }
    }
}

/// Whether `content_type` denotes JSON (`application/json`, `application/*+json`).
pub fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == APPLICATION_JSON || (essence.starts_with("application/") && essence.ends_with("+json"))
}
