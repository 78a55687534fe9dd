//! Canopy: a declarative tree-to-server runtime.
//!
//! Applications are written as a tree of nodes. Booting the tree walks it
//! once, propagating configuration downward and registering routes against
//! an HTTP engine; at request time each route runs its inherited middleware
//! chain before the handler.
//!
//! # Architecture Overview
//!
//! ```text
//!   Boot:
//!     Node tree ──▶ node::resolve ──▶ tree::walker ──▶ http engine
//!                   (composites)      (config copy-    (axum router)
//!                                      with-override)       │
//!                        ┌────────────────┐                 │
//!                        │ routing        │◀── Routes nodes ┘
//!                        │ (file router)  │
//!                        └────────────────┘
//!
//!   Request:
//!     axum ──▶ pipeline::handle ──▶ middleware chain ──▶ handler
//!               │ rate limit          │ timeout, halt,     │
//!               │ (security)          │ augment            ▼
//!               ▼                     ▼              response descriptor
//!             429 ────────────▶ Rendered ◀────────── resolution
//! ```
//!
//! # Cross-Cutting Concerns
//!
//! - `security`: error sanitization, prototype-key filtering, rate limiting
//! - `resilience`: per-middleware timeouts
//! - `observability`: reloadable tracing setup
//! - `lifecycle`: startup options, graceful shutdown

// Core subsystems
pub mod config;
pub mod http;
pub mod node;
pub mod pipeline;
pub mod routing;
pub mod tree;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;

pub use config::schema::{CorsSpec, LogLevel, RateLimitSpec, RouteConfig};
pub use http::engine::{EngineError, HttpEngine};
pub use http::server::AxumEngine;
pub use lifecycle::{boot_engine, run, CliArgs, ListenOptions, Shutdown};
pub use node::{
    composite_fn, handler, middleware_fn, plugin_fn, provider, Component, Node, Props,
};
pub use pipeline::middleware::{HandlerError, MiddlewareOutcome};
pub use pipeline::{HandlerOutcome, RequestContext};
pub use routing::source::{FsModules, ModuleSource, RouteModule, StaticModules};
pub use tree::{boot, BootError};
