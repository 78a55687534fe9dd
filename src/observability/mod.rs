//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events)
//!
//! Logger nodes at boot:
//!     → logging.rs set_level (reloadable threshold)
//! ```
//!
//! # Design Decisions
//! - Structured logging via tracing; request ID flows through all events
//! - The host threshold is reloadable so a Logger node can retarget it
//! - Environment filter wins over code-supplied defaults when set

pub mod logging;
