//! HTTP engine subsystem.
//!
//! # Data Flow
//! ```text
//! Boot:
//!     tree/walker.rs + routing/discover.rs
//!         → engine.rs (registration seam)
//!         → server.rs (axum Router assembly, layers)
//!
//! Per request:
//!     axum dispatch → server.rs adapter (context build)
//!         → pipeline → Rendered → axum Response
//! ```
//!
//! # Design Decisions
//! - The engine owns all socket/connection/listen behavior; the core only
//!   registers routes and layers against it
//! - One adapter handler per registered route, each capturing its frozen
//!   CompiledRoute

pub mod engine;
pub mod server;

pub use engine::{EngineError, HttpEngine};
pub use server::AxumEngine;
