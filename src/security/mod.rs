//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (check propagated per-route limits)
//!     → pipeline (middleware, handler)
//!     → sanitize.rs (error messages filtered before leaving the process)
//!
//! Middleware Augment signals:
//!     → sanitize.rs safe_merge (prototype-pollution keys refused)
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - Clients only ever see short, pattern-filtered error strings
//! - No trust in client input

pub mod rate_limit;
pub mod sanitize;

pub use rate_limit::RateLimiter;
pub use sanitize::{safe_merge, sanitize_error_message};
