//! Route pattern matching.
//!
//! # Responsibilities
//! - Compile `{name}` / `{*}` path patterns once, at route construction
//! - Match request paths case-insensitively
//! - Match HTTP methods case-insensitively, with `*` as a wildcard
//!
//! # Design Decisions
//! - `{name}` matches exactly one non-empty path segment
//! - `{*}` matches any remaining characters, separators included
//! - Everything else is literal; a pattern that fails to compile degrades to
//!   exact (case-insensitive) string comparison instead of being rejected

use regex::{Regex, RegexBuilder};

/// Method value that matches every verb.
pub const ANY_METHOD: &str = "*";

/// A compiled path pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    compiled: Option<Regex>,
}

impl PathPattern {
    /// Compile a pattern. Never fails; see [`PathPattern::is_literal`].
    pub fn new(pattern: impl Into<String>) -> Self {
        let source = pattern.into();
        let compiled = match compile(&source) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!(pattern = %source, error = %e, "Pattern failed to compile, using literal match");
                None
            }
        };
        Self { source, compiled }
    }

    /// The pattern as configured.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True when the pattern fell back to literal matching.
    pub fn is_literal(&self) -> bool {
        self.compiled.is_none()
    }

    /// Returns true if `path` satisfies this pattern.
    pub fn matches(&self, path: &str) -> bool {
        match &self.compiled {
            Some(re) => re.is_match(path),
            None => self.source.eq_ignore_ascii_case(path),
        }
    }
}

/// Returns true if the configured method accepts the request method.
pub fn method_matches(configured: &str, actual: &str) -> bool {
    configured == ANY_METHOD || configured.eq_ignore_ascii_case(actual)
}

/// Translate a route pattern into an anchored, case-insensitive regex.
fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    let mut expr = String::with_capacity(pattern.len() + 8);
    expr.push('^');

    let mut rest = pattern;
    while let Some(open) = rest.find('{') {
        expr.push_str(&regex::escape(&rest[..open]));
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                if name == "*" {
                    expr.push_str(".*");
                } else {
                    expr.push_str("[^/]+");
                }
                rest = &after[close + 1..];
            }
            None => {
                // Unterminated brace is literal text
                expr.push_str(&regex::escape(&rest[open..]));
                rest = "";
            }
        }
    }
    expr.push_str(&regex::escape(rest));
    expr.push('$');

    RegexBuilder::new(&expr).case_insensitive(true).build()
}
