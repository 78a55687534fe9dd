//! Per-request middleware pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (http/server.rs):
//!     → context.rs (params, query, body, service handle)
//!     → rate limit check (security/rate_limit.rs)
//!     → middleware.rs outcomes, in config order, each under a timeout
//!     → route handler
//!     → response.rs (descriptor tree → Rendered)
//! ```
//!
//! # Design Decisions
//! - Signal values instead of exceptions/early returns: every middleware
//!   outcome is an explicit sum-type variant
//! - All per-request failures are contained within that request
//! - Clients only ever see sanitized error envelopes

pub mod context;
pub mod middleware;
pub mod response;

pub use context::RequestContext;
pub use middleware::{HandlerError, MiddlewareOutcome};
pub use response::{resolve_response, Rendered};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use serde_json::Value;

use crate::config::schema::RouteConfig;
use crate::node::{HandlerFn, Node};
use crate::resilience::timeouts::with_timeout;
use crate::security::rate_limit::RateLimiter;
use crate::security::sanitize::{safe_merge, sanitize_error_message};

/// Default bound on a single middleware invocation.
pub const DEFAULT_MIDDLEWARE_TIMEOUT: Duration = Duration::from_millis(30_000);

/// What a route handler produced.
pub enum HandlerOutcome {
    /// A Response-descriptor tree to run through the resolver.
    Render(Node),
    /// A plain value sent verbatim as the body with status 200.
    Json(Value),
    /// A fully formed response bypassing the resolver.
    Response(Rendered),
}

impl fmt::Debug for HandlerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerOutcome::Render(node) => write!(f, "Render({node:?})"),
            HandlerOutcome::Json(v) => write!(f, "Json({v})"),
            HandlerOutcome::Response(r) => write!(f, "Response({})", r.status),
        }
    }
}

/// A registered route: URL pattern, handler, and its frozen merged config.
#[derive(Clone)]
pub struct CompiledRoute {
    pub method: Method,
    pub url: String,
    pub handler: HandlerFn,
    pub config: Arc<RouteConfig>,
    pub schema: Option<Value>,
    pub middleware_timeout: Duration,
}

impl CompiledRoute {
    pub fn new(method: Method, url: impl Into<String>, handler: HandlerFn, config: Arc<RouteConfig>) -> Self {
        Self {
            method,
            url: url.into(),
            handler,
            config,
            schema: None,
            middleware_timeout: DEFAULT_MIDDLEWARE_TIMEOUT,
        }
    }
}

impl fmt::Debug for CompiledRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRoute")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("config", &self.config)
            .finish()
    }
}

/// Run one request through the merged middleware list and the handler.
///
/// Never returns an error: every failure mode is converted into a
/// sanitized `Rendered` envelope.
pub async fn handle(route: &CompiledRoute, limiter: &RateLimiter, mut ctx: RequestContext) -> Rendered {
    if let Some(spec) = &route.config.rate_limit {
        let client = ctx
            .client
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let key = format!("{client}|{}", route.url);
        if !limiter.check(&key, spec) {
            tracing::warn!(
                request_id = %ctx.request_id,
                client = %client,
                url = %route.url,
                "Rate limit exceeded"
            );
            return Rendered::error(429, "Rate limit exceeded");
        }
    }

    for scoped in &route.config.middleware {
        let invocation = (scoped.func)(ctx.clone());
        let outcome = match with_timeout(invocation, route.middleware_timeout, "Middleware timed out").await {
            Ok(result) => result,
            Err(expired) => {
                tracing::error!(
                    request_id = %ctx.request_id,
                    url = %route.url,
                    limit_ms = expired.limit.as_millis() as u64,
                    "Middleware timed out"
                );
                return Rendered::error(
                    500,
                    &sanitize_error_message(&expired.message, "Middleware timed out"),
                );
            }
        };

        match outcome {
            Ok(MiddlewareOutcome::Continue) => {}
            Ok(MiddlewareOutcome::HaltSilently) => {
                // the middleware already answered; nothing left to send
                return Rendered::empty(204);
            }
            Ok(MiddlewareOutcome::Augment(fields)) => {
                safe_merge(&mut ctx.extras, &fields);
            }
            Ok(MiddlewareOutcome::HaltWithError { status, message }) => {
                return Rendered::error(
                    status,
                    &sanitize_error_message(&message, "Request rejected"),
                );
            }
            Err(err) => {
                let status = err.status.unwrap_or(500);
                tracing::warn!(
                    request_id = %ctx.request_id,
                    url = %route.url,
                    status,
                    "Middleware failed"
                );
                return Rendered::error(
                    status,
                    &sanitize_error_message(&err.message, "Internal server error"),
                );
            }
        }
    }

    match (route.handler)(ctx.clone()).await {
        Ok(HandlerOutcome::Render(tree)) => match resolve_response(&tree) {
            Ok(rendered) => rendered,
            Err(err) => {
                tracing::error!(
                    request_id = %ctx.request_id,
                    url = %route.url,
                    error = %err,
                    "Response descriptor failed to resolve"
                );
                Rendered::error(500, "Internal server error")
            }
        },
        Ok(HandlerOutcome::Json(value)) => Rendered::ok(value),
        Ok(HandlerOutcome::Response(rendered)) => rendered,
        Err(err) => {
            let status = err.status.unwrap_or(500);
            tracing::warn!(
                request_id = %ctx.request_id,
                url = %route.url,
                status,
                "Handler failed"
            );
            Rendered::error(
                status,
                &sanitize_error_message(&err.message, "Internal server error"),
            )
        }
    }
}
