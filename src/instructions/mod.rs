//! Natural-language instructions that steer generated responses.
//!
//! Each mock server owns one `InstructionsContainer`; nothing here is global,
//! so several servers can run side by side with different instructions.
//!
//! Resolution order for a request is fixed: defaults, globals, then the list of
//! the first matching route instruction. The resolved list feeds the cache key,
//! so changing the order would orphan every cached body.

use std::sync::{Mutex, MutexGuard};

use crate::routing::matcher::{method_matches, PathPattern};

/// Instructions scoped to requests matching a pattern and method.
#[derive(Debug, Clone)]
pub struct RouteInstruction {
    pattern: PathPattern,
    method: String,
    instructions: Vec<String>,
}

impl RouteInstruction {
    pub fn new<I, S>(pattern: impl Into<String>, method: impl Into<String>, instructions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pattern: PathPattern::new(pattern),
            method: method.into(),
            instructions: instructions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn instructions(&self) -> &[String] {
        &self.instructions
    }

    pub fn matches(&self, path: &str, method: &str) -> bool {
        method_matches(&self.method, method) && self.pattern.matches(path)
    }
}

#[derive(Debug, Default)]
struct Inner {
    global: Vec<String>,
    routes: Vec<RouteInstruction>,
}

/// Default, global and route-scoped instructions for one mock server.
#[derive(Debug)]
pub struct InstructionsContainer {
    defaults: Vec<String>,
    inner: Mutex<Inner>,
}

impl InstructionsContainer {
    /// Create a container whose defaults describe the simulated API.
    pub fn new(api_name: &str) -> Self {
        Self {
            defaults: default_instructions(api_name),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Append a global instruction applied to every request.
    pub fn add_instruction(&self, instruction: impl Into<String>) {
        self.lock().global.push(instruction.into());
    }

    /// Remove all global instructions. Defaults and route instructions remain.
    pub fn clear_instructions(&self) {
        self.lock().global.clear();
    }

    /// Register route-scoped instructions. They cannot be removed individually.
    pub fn add_route_instruction(&self, route_instruction: RouteInstruction) {
        tracing::debug!(
            pattern = %route_instruction.pattern(),
            method = %route_instruction.method(),
            count = route_instruction.instructions().len(),
            "Route instruction added"
        );
        self.lock().routes.push(route_instruction);
    }

    pub fn default_instructions(&self) -> &[String] {
        &self.defaults
    }

    pub fn global_instructions(&self) -> Vec<String> {
        self.lock().global.clone()
    }

    /// Resolve the ordered instruction list for a request.
    pub fn instructions_for_request(&self, path: &str, method: &str) -> Vec<String> {
        let inner = self.lock();
        let mut resolved = Vec::with_capacity(self.defaults.len() + inner.global.len());
        resolved.extend(self.defaults.iter().cloned());
        resolved.extend(inner.global.iter().cloned());
        if let Some(route) = inner.routes.iter().find(|r| r.matches(path, method)) {
            resolved.extend(route.instructions.iter().cloned());
        }
        resolved
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn default_instructions(api_name: &str) -> Vec<String> {
    vec![
        format!(
            "You are a mock server simulating the {} API. Reply with the HTTP response body \
             that the real API would return for the request described in the final message.",
            api_name
        ),
        "Return only the response body: no explanations, no Markdown code fences.".to_string(),
        "Unless instructed otherwise, respond with well-formed JSON.".to_string(),
        "Use realistic, internally consistent values and echo identifiers and fields \
         from the request path, query and body where appropriate."
            .to_string(),
    ]
}
