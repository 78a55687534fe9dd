//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Resolve listen options → Init logging → Boot tree → Bind → Serve
//!
//! Shutdown (shutdown.rs):
//!     Ctrl-C → broadcast signal → engine drains in-flight requests → Exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: logging first, then the tree, the listener last
//! - Shutdown is a broadcast channel so embedders can add their own
//!   triggers next to Ctrl-C

pub mod shutdown;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{boot_engine, run, CliArgs, ListenOptions};
