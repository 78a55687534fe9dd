//! Tree walking subsystem.
//!
//! # Data Flow
//! ```text
//! Boot:
//!     root Node → walker.rs (must resolve to Server)
//!     → depth-first walk, config copy-with-override per node
//!     → http engine registration / routing discovery side effects
//! ```
//!
//! # Design Decisions
//! - Strict sequential traversal: each async step (notably Db) is awaited
//!   before any deeper node, so routes never register before the service
//!   handle they depend on exists
//! - Only the Db step is boot-fatal; everything else logs and continues

pub mod walker;

pub use walker::{boot, BootError};
