//! Resilience subsystem.
//!
//! # Design Decisions
//! - Every user-supplied middleware invocation is bounded by a timeout
//! - Timeout errors are distinct from other errors (504-style mapping is
//!   the caller's decision, not the timer's)

pub mod timeouts;

pub use timeouts::{with_timeout, TimeoutError};
