//! Registration seam between the tree walker and the HTTP engine.

use axum::http::Method;
use thiserror::Error;

use crate::config::schema::CorsSpec;
use crate::pipeline::CompiledRoute;

#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("unsupported method {0}")]
    UnsupportedMethod(Method),
    #[error("duplicate route {method} {url}")]
    DuplicateRoute { method: Method, url: String },
    #[error("invalid CORS spec: {0}")]
    InvalidCors(String),
}

/// The HTTP engine collaborator.
///
/// Implementations own sockets, connections and request concurrency; the
/// core only registers routes and cross-cutting behavior through this
/// trait. Implemented by `AxumEngine` and by recording fakes in tests.
pub trait HttpEngine {
    /// Register one route. Exactly one registration per method+URL pair.
    fn register(&mut self, route: CompiledRoute) -> Result<(), EngineError>;

    /// Register CORS support from a propagated spec.
    fn enable_cors(&mut self, spec: &CorsSpec) -> Result<(), EngineError>;

    /// Ordered table of every registered (method, URL) pair.
    fn routes(&self) -> &[(Method, String)];
}
