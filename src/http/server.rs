//! Axum-backed HTTP engine.
//!
//! # Responsibilities
//! - Collect registered routes into an axum Router
//! - Adapt each request into a RequestContext and each Rendered back into
//!   an HTTP response
//! - Wire up server-level middleware (tracing, timeout, request ID, CORS)
//! - Serve with graceful shutdown
//!
//! # Design Decisions
//! - One adapter closure per route, capturing its frozen CompiledRoute;
//!   no shared mutable state at request time
//! - Path params come from our own pattern matcher, so file-router and
//!   tree-declared routes behave identically
//! - Request bodies are buffered up to a fixed limit before parsing

use std::collections::HashMap;
use std::mem;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{ConnectInfo, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{on, MethodFilter};
use axum::{Json, Router};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::schema::CorsSpec;
use crate::http::engine::{EngineError, HttpEngine};
use crate::pipeline::context::RequestContext;
use crate::pipeline::response::Rendered;
use crate::pipeline::{self, CompiledRoute};
use crate::routing::paths;
use crate::security::rate_limit::RateLimiter;

/// Largest request body buffered for parsing.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Whole-request bound applied as a server layer.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP engine built on axum.
pub struct AxumEngine {
    router: Router,
    cors: Option<CorsLayer>,
    limiter: Arc<RateLimiter>,
    table: Vec<(Method, String)>,
    request_timeout: Duration,
}

impl AxumEngine {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            cors: None,
            limiter: Arc::new(RateLimiter::new()),
            table: Vec::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Finalize the router with server-level layers. Later layers are
    /// outermost; request IDs must be set before tracing sees the request.
    pub fn build(self) -> Router {
        let mut router = self.router;
        if let Some(cors) = self.cors {
            router = router.layer(cors);
        }
        router
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(self.request_timeout))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Serve until the shutdown signal fires.
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        let route_count = self.table.len();
        tracing::info!(address = %addr, routes = route_count, "HTTP server starting");

        let app = self.build().into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

impl Default for AxumEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpEngine for AxumEngine {
    fn register(&mut self, mut route: CompiledRoute) -> Result<(), EngineError> {
        let pattern = paths::join(&[&route.url]);
        route.url = pattern.clone();

        if self
            .table
            .iter()
            .any(|(m, u)| *m == route.method && *u == pattern)
        {
            return Err(EngineError::DuplicateRoute {
                method: route.method,
                url: pattern,
            });
        }
        let filter = method_filter(&route.method)
            .ok_or_else(|| EngineError::UnsupportedMethod(route.method.clone()))?;

        let method = route.method.clone();
        let shared = Arc::new(route);
        let limiter = self.limiter.clone();
        let adapter = move |request: Request| {
            let route = shared.clone();
            let limiter = limiter.clone();
            async move {
                let ctx = build_context(&route, request).await;
                let rendered = pipeline::handle(&route, &limiter, ctx).await;
                render_to_response(rendered)
            }
        };

        self.router = mem::take(&mut self.router).route(&pattern, on(filter, adapter));
        self.table.push((method, pattern));
        Ok(())
    }

    fn enable_cors(&mut self, spec: &CorsSpec) -> Result<(), EngineError> {
        let mut layer = CorsLayer::new();

        layer = if spec.allow_origin == "*" {
            layer.allow_origin(Any)
        } else {
            let origin: HeaderValue = spec.allow_origin.parse().map_err(|_| {
                EngineError::InvalidCors(format!("bad origin `{}`", spec.allow_origin))
            })?;
            layer.allow_origin(origin)
        };

        layer = if spec.allow_methods.is_empty() {
            layer.allow_methods(Any)
        } else {
            let methods: Vec<Method> = spec
                .allow_methods
                .iter()
                .map(|m| m.parse::<Method>())
                .collect::<Result<_, _>>()
                .map_err(|_| EngineError::InvalidCors("bad method".to_string()))?;
            layer.allow_methods(methods)
        };

        layer = if spec.allow_headers.is_empty() {
            layer.allow_headers(Any)
        } else {
            let headers: Vec<HeaderName> = spec
                .allow_headers
                .iter()
                .map(|h| h.parse::<HeaderName>())
                .collect::<Result<_, _>>()
                .map_err(|_| EngineError::InvalidCors("bad header name".to_string()))?;
            layer.allow_headers(headers)
        };

        tracing::info!(origin = %spec.allow_origin, "CORS registered");
        self.cors = Some(layer);
        Ok(())
    }

    fn routes(&self) -> &[(Method, String)] {
        &self.table
    }
}

fn method_filter(method: &Method) -> Option<MethodFilter> {
    match method.as_str() {
        "GET" => Some(MethodFilter::GET),
        "POST" => Some(MethodFilter::POST),
        "PUT" => Some(MethodFilter::PUT),
        "DELETE" => Some(MethodFilter::DELETE),
        "PATCH" => Some(MethodFilter::PATCH),
        "HEAD" => Some(MethodFilter::HEAD),
        "OPTIONS" => Some(MethodFilter::OPTIONS),
        _ => None,
    }
}

/// Build the per-request handler context from an axum request.
async fn build_context(route: &CompiledRoute, request: Request) -> RequestContext {
    let (parts, body) = request.into_parts();

    let request_id = parts
        .headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let client = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());

    let path = parts.uri.path().to_string();
    let params = paths::match_params(&route.url, &path).unwrap_or_default();

    let query: HashMap<String, String> = parts
        .uri
        .query()
        .map(|qs| {
            url::form_urlencoded::parse(qs.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect()
        })
        .unwrap_or_default();

    let is_json = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("json"));

    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) if bytes.is_empty() => Value::Null,
        Ok(bytes) if is_json => serde_json::from_slice(&bytes).unwrap_or_else(|err| {
            tracing::warn!(request_id = %request_id, error = %err, "Malformed JSON body");
            Value::Null
        }),
        Ok(bytes) => Value::String(String::from_utf8_lossy(&bytes).into_owned()),
        Err(err) => {
            tracing::warn!(request_id = %request_id, error = %err, "Failed to read request body");
            Value::Null
        }
    };

    RequestContext {
        method: parts.method,
        path,
        params,
        query,
        headers: parts.headers,
        body,
        request_id,
        client,
        service: route.config.service.clone(),
        extras: crate::node::Props::new(),
    }
}

/// Convert a resolved descriptor into an HTTP response.
fn render_to_response(rendered: Rendered) -> Response {
    let status =
        StatusCode::from_u16(rendered.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut response: Response<Body> = match rendered.body {
        Value::Null => status.into_response(),
        Value::String(text) => (status, text).into_response(),
        other => (status, Json(other)).into_response(),
    };

    for (name, value) in &rendered.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                response.headers_mut().insert(name, value);
            }
            _ => {
                tracing::warn!(header = %name, "Dropping invalid response header");
            }
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RouteConfig;
    use crate::node::handler;
    use crate::pipeline::HandlerOutcome;
    use serde_json::json;
    use tower::ServiceExt;

    fn echo_param_route(url: &str) -> CompiledRoute {
        CompiledRoute::new(
            Method::GET,
            url,
            handler(|ctx| async move {
                Ok(HandlerOutcome::Json(json!({
                    "id": ctx.param("id"),
                    "q": ctx.query_param("q"),
                })))
            }),
            Arc::new(RouteConfig::default()),
        )
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), MAX_BODY_BYTES)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut engine = AxumEngine::new();
        engine.register(echo_param_route("/posts/{id}")).unwrap();
        let err = engine.register(echo_param_route("/posts/{id}")).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateRoute { .. }));
    }

    #[test]
    fn test_table_preserves_registration_order() {
        let mut engine = AxumEngine::new();
        engine.register(echo_param_route("/b")).unwrap();
        engine.register(echo_param_route("/a")).unwrap();
        let urls: Vec<&str> = engine.routes().iter().map(|(_, u)| u.as_str()).collect();
        assert_eq!(urls, vec!["/b", "/a"]);
    }

    #[test]
    fn test_bracket_urls_normalized_at_registration() {
        let mut engine = AxumEngine::new();
        engine.register(echo_param_route("/posts/[id]")).unwrap();
        assert_eq!(engine.routes()[0].1, "/posts/{id}");
    }

    #[tokio::test]
    async fn test_params_and_query_reach_handler() {
        let mut engine = AxumEngine::new();
        engine.register(echo_param_route("/posts/{id}")).unwrap();
        let router = engine.build();

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/posts/42?q=hello")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"id": "42", "q": "hello"}));
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let mut engine = AxumEngine::new();
        engine.register(echo_param_route("/known")).unwrap();
        let router = engine.build();

        let response = router
            .oneshot(Request::builder().uri("/unknown").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_rendered_headers_applied() {
        let mut engine = AxumEngine::new();
        engine
            .register(CompiledRoute::new(
                Method::GET,
                "/h",
                handler(|_ctx| async {
                    let mut rendered = Rendered::empty(201);
                    rendered
                        .headers
                        .insert("x-custom".to_string(), "yes".to_string());
                    Ok(HandlerOutcome::Response(rendered))
                }),
                Arc::new(RouteConfig::default()),
            ))
            .unwrap();
        let router = engine.build();

        let response = router
            .oneshot(Request::builder().uri("/h").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get("x-custom").unwrap().to_str().unwrap(),
            "yes"
        );
    }

    #[tokio::test]
    async fn test_json_body_parsed_into_context() {
        let mut engine = AxumEngine::new();
        engine
            .register(CompiledRoute::new(
                Method::POST,
                "/echo",
                handler(|ctx| async move { Ok(HandlerOutcome::Json(ctx.body)) }),
                Arc::new(RouteConfig::default()),
            ))
            .unwrap();
        let router = engine.build();

        let response = router
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/echo")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"n": 5}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(body_json(response).await, json!({"n": 5}));
    }
}
