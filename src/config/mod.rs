//! Propagated configuration subsystem.
//!
//! # Data Flow
//! ```text
//! Tree walk (boot):
//!     RouteConfig (root default)
//!     → copy-with-override per node (Logger, Db, Cors, RateLimiter,
//!       Middleware, Group)
//!     → frozen into Arc<RouteConfig> at route registration
//!
//! Per request:
//!     Arc<RouteConfig> read concurrently, never mutated
//! ```
//!
//! # Design Decisions
//! - Immutable value type: every override builds a new config
//! - Children never observe a sibling branch's overrides
//! - Middleware snapshots exclude the middleware list itself

pub mod schema;

pub use schema::{
    ConfigSnapshot, CorsSpec, LogLevel, RateLimitSpec, RouteConfig, ScopedMiddleware,
};
