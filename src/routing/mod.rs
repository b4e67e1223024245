//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (linear scan of RouteRegistry)
//!     → matcher.rs (compiled path pattern + method check)
//!     → Return: matched RouteConfiguration or None (404)
//! ```
//!
//! # Design Decisions
//! - Routes are add/remove only; updating a route means remove then add
//! - Deterministic: same registry contents always match the same route
//! - First match wins (insertion order)

pub mod matcher;
pub mod router;

pub use matcher::{method_matches, PathPattern, ANY_METHOD};
pub use router::{RouteConfiguration, RouteRegistry};
