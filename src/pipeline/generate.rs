//! Post-processing of backend output.

use crate::pipeline::PipelineError;
use crate::strategy::is_json_content_type;

const FENCE: &str = "```";

/// Trim whitespace and one surrounding Markdown code fence.
///
/// "```json\n{...}\n```" becomes "{...}". Text without a leading fence is
/// only trimmed.
pub fn clean_generated(raw: &str) -> String {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix(FENCE) else {
        return trimmed.to_string();
    };

    // Drop the info string (`json`, `xml`, ...) on the opening line.
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    let rest = rest.trim_end();
    rest.strip_suffix(FENCE).unwrap_or(rest).trim().to_string()
}

/// Reject bodies that cannot be served as `content_type`.
pub fn validate_generated(body: &str, content_type: &str) -> Result<(), PipelineError> {
    if body.is_empty() {
        return Err(PipelineError::InvalidContent("empty body".to_string()));
    }
    if is_json_content_type(content_type) {
        serde_json::from_str::<serde_json::Value>(body)
            .map_err(|e| PipelineError::InvalidContent(format!("not valid JSON ({})", e)))?;
    }
    Ok(())
}
