//! Route registry and lookup.
//!
//! # Responsibilities
//! - Store route configurations in insertion order
//! - Look up the route for a request path and method
//! - Support add/remove/clear at runtime from any task
//!
//! # Design Decisions
//! - One mutex guards the list; it is held for the list operation only
//! - Lookups hand out `Arc` clones so strategies run with the lock released
//! - O(n) linear scan; first match by insertion order wins

use std::sync::{Arc, Mutex, MutexGuard};

use crate::routing::matcher::{method_matches, PathPattern};
use crate::strategy::ResponseStrategy;

/// A (pattern, method) binding to a response strategy.
#[derive(Debug)]
pub struct RouteConfiguration {
    pattern: PathPattern,
    method: String,
    strategy: ResponseStrategy,
}

impl RouteConfiguration {
    /// Create a route. The pattern is compiled here, once.
    pub fn new(pattern: impl Into<String>, method: impl Into<String>, strategy: ResponseStrategy) -> Self {
        Self {
            pattern: PathPattern::new(pattern),
            method: method.into(),
            strategy,
        }
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn strategy(&self) -> &ResponseStrategy {
        &self.strategy
    }

    /// Returns true if this route accepts the request.
    pub fn matches(&self, path: &str, method: &str) -> bool {
        method_matches(&self.method, method) && self.pattern.matches(path)
    }

    fn is_keyed_by(&self, pattern: &str, method: &str) -> bool {
        self.pattern.as_str().eq_ignore_ascii_case(pattern) && self.method.eq_ignore_ascii_case(method)
    }
}

/// Ordered, thread-safe collection of routes.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: Mutex<Vec<Arc<RouteConfiguration>>>,
}

impl RouteRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route. Duplicates are allowed; the earlier one keeps winning.
    pub fn add(&self, route: RouteConfiguration) {
        tracing::debug!(pattern = %route.pattern(), method = %route.method(), "Route added");
        self.lock().push(Arc::new(route));
    }

    /// Remove the first route configured with exactly this pattern and method.
    pub fn remove(&self, pattern: &str, method: &str) -> bool {
        let mut routes = self.lock();
        match routes.iter().position(|r| r.is_keyed_by(pattern, method)) {
            Some(index) => {
                routes.remove(index);
                tracing::debug!(pattern = %pattern, method = %method, "Route removed");
                true
            }
            None => false,
        }
    }

    /// Remove every route.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Find the first route accepting `method` and `path`.
    pub fn match_route(&self, path: &str, method: &str) -> Option<Arc<RouteConfiguration>> {
        self.lock().iter().find(|r| r.matches(path, method)).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<RouteConfiguration>>> {
        // A poisoned lock only means a panic happened mid-push/remove; the Vec is still usable.
        self.routes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(body: &str) -> ResponseStrategy {
        ResponseStrategy::static_text(body.to_string())
    }

    fn body_of(route: &RouteConfiguration) -> String {
        match route.strategy() {
            ResponseStrategy::Static(s) => String::from_utf8_lossy(&s.body).into_owned(),
            other => panic!("unexpected strategy {:?}", other),
        }
    }

    #[test]
    fn test_match_returns_route_for_matching_path() {
        let registry = RouteRegistry::new();
        registry.add(RouteConfiguration::new("/api/users/{id}", "GET", text("user")));

        let route = registry.match_route("/api/users/7", "GET").unwrap();
        assert_eq!(route.pattern(), "/api/users/{id}");
        assert!(registry.match_route("/api/users/7", "POST").is_none());
        assert!(registry.match_route("/api/users", "GET").is_none());
    }

    #[test]
    fn test_wildcard_method_matches_every_verb() {
        let registry = RouteRegistry::new();
        registry.add(RouteConfiguration::new("/any", "*", text("any")));

        for method in ["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"] {
            assert!(registry.match_route("/any", method).is_some(), "{} should match", method);
        }
    }

    #[test]
    fn test_first_match_wins_by_insertion_order() {
        let registry = RouteRegistry::new();
        registry.add(RouteConfiguration::new("/api/{*}", "*", text("catch-all")));
        registry.add(RouteConfiguration::new("/api/specific", "GET", text("specific")));

        let route = registry.match_route("/api/specific", "GET").unwrap();
        assert_eq!(body_of(&route), "catch-all");
    }

    #[test]
    fn test_remove_reports_existence() {
        let registry = RouteRegistry::new();
        registry.add(RouteConfiguration::new("/api/test", "GET", text("x")));

        assert!(registry.remove("/api/test", "GET"));
        assert!(!registry.remove("/api/test", "GET"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_only_first_duplicate() {
        let registry = RouteRegistry::new();
        registry.add(RouteConfiguration::new("/dup", "GET", text("first")));
        registry.add(RouteConfiguration::new("/dup", "GET", text("second")));

        assert!(registry.remove("/DUP", "get"));
        assert_eq!(registry.len(), 1);
        assert_eq!(body_of(&registry.match_route("/dup", "GET").unwrap()), "second");
    }

    #[test]
    fn test_clear() {
        let registry = RouteRegistry::new();
        registry.add(RouteConfiguration::new("/a", "GET", text("a")));
        registry.add(RouteConfiguration::new("/b", "GET", text("b")));
        registry.clear();

        assert!(registry.is_empty());
        assert!(registry.match_route("/a", "GET").is_none());
    }

    #[test]
    fn test_matched_route_outlives_removal() {
        let registry = RouteRegistry::new();
        registry.add(RouteConfiguration::new("/held", "GET", text("held")));

        let held = registry.match_route("/held", "GET").unwrap();
        registry.clear();
        assert_eq!(body_of(&held), "held");
    }
}
