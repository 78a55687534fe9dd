//! Declarative node tree subsystem.
//!
//! # Data Flow
//! ```text
//! Tree construction (user code):
//!     constructors → Node values (components, composites, fragments)
//!
//! Boot (tree/walker.rs):
//!     Node → resolve.rs (composite expansion) → tagged Component
//!     → config propagation → route registration
//!
//! Per request (pipeline/response.rs):
//!     Response-descriptor Node tree → resolve.rs → Rendered
//! ```
//!
//! # Design Decisions
//! - Nodes are pure data; function payloads are shared `Arc` closures
//! - Closed Component enum with exhaustive matches (no default fallthrough)
//! - Composite expansion is depth-bounded, never unbounded recursion

pub mod component;
pub mod resolve;

pub use component::Component;
pub use resolve::{resolve, Resolved, ResolveError, MAX_COMPOSITE_DEPTH};

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use axum::http::Method;
use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::config::schema::{CorsSpec, LogLevel, RateLimitSpec, RouteConfig};
use crate::http::engine::HttpEngine;
use crate::pipeline::context::RequestContext;
use crate::pipeline::middleware::{HandlerError, MiddlewareOutcome};
use crate::pipeline::HandlerOutcome;

/// Property bag attached to composites and plugins.
pub type Props = serde_json::Map<String, Value>;

/// Boxed error used at collaborator seams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Opaque handle produced by an external service provider (e.g. a database
/// connection). Threaded through `RouteConfig`, never inspected by the core.
pub type ServiceHandle = Arc<dyn Any + Send + Sync>;

/// Async factory invoked exactly once per Db node at boot.
pub type ServiceProvider =
    Arc<dyn Fn() -> BoxFuture<'static, Result<ServiceHandle, BoxError>> + Send + Sync>;

/// Per-request middleware function.
pub type MiddlewareFn = Arc<
    dyn Fn(RequestContext) -> BoxFuture<'static, Result<MiddlewareOutcome, HandlerError>>
        + Send
        + Sync,
>;

/// Route handler function.
pub type HandlerFn = Arc<
    dyn Fn(RequestContext) -> BoxFuture<'static, Result<HandlerOutcome, HandlerError>>
        + Send
        + Sync,
>;

/// External add-on mounted against the engine at boot. Registration is
/// synchronous; async work belongs in whatever handlers the plugin mounts.
pub type PluginFn =
    Arc<dyn Fn(&mut dyn HttpEngine, &Props, &RouteConfig) -> Result<(), BoxError> + Send + Sync>;

/// A composite: a function node expanded by the resolver.
pub type CompositeFn = Arc<dyn Fn(&Props, &[Node]) -> Node + Send + Sync>;

/// A value in the declarative configuration tree.
#[derive(Clone)]
pub enum Node {
    /// Absent value; dropped at resolution time.
    Empty,
    /// Primitive leaf; dropped at resolution time.
    Value(Value),
    /// Ordered list of nodes, resolved element-wise.
    Fragment(Vec<Node>),
    /// A resolved, tagged configuration unit.
    Item(Component),
    /// A function node to be expanded by the resolver.
    Composite {
        func: CompositeFn,
        props: Props,
        children: Vec<Node>,
    },
}

impl Node {
    pub fn fragment(children: Vec<Node>) -> Self {
        Node::Fragment(children)
    }

    pub fn composite(func: CompositeFn, props: Props, children: Vec<Node>) -> Self {
        Node::Composite {
            func,
            props,
            children,
        }
    }

    pub fn server(children: Vec<Node>) -> Self {
        Node::Item(Component::Server { children })
    }

    pub fn route(method: Method, path: impl Into<String>, handler: HandlerFn) -> Self {
        Node::Item(Component::Route {
            method,
            path: path.into(),
            handler,
            schema: None,
        })
    }

    pub fn get(path: impl Into<String>, handler: HandlerFn) -> Self {
        Self::route(Method::GET, path, handler)
    }

    pub fn post(path: impl Into<String>, handler: HandlerFn) -> Self {
        Self::route(Method::POST, path, handler)
    }

    pub fn put(path: impl Into<String>, handler: HandlerFn) -> Self {
        Self::route(Method::PUT, path, handler)
    }

    pub fn delete(path: impl Into<String>, handler: HandlerFn) -> Self {
        Self::route(Method::DELETE, path, handler)
    }

    pub fn patch(path: impl Into<String>, handler: HandlerFn) -> Self {
        Self::route(Method::PATCH, path, handler)
    }

    pub fn middleware(func: MiddlewareFn, children: Vec<Node>) -> Self {
        Node::Item(Component::Middleware { func, children })
    }

    pub fn db(provider: ServiceProvider, children: Vec<Node>) -> Self {
        Node::Item(Component::Db { provider, children })
    }

    pub fn logger(level: LogLevel, children: Vec<Node>) -> Self {
        Node::Item(Component::Logger { level, children })
    }

    pub fn group(prefix: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Item(Component::Group {
            prefix: prefix.into(),
            children,
        })
    }

    pub fn cors(spec: CorsSpec, children: Vec<Node>) -> Self {
        Node::Item(Component::Cors { spec, children })
    }

    pub fn rate_limiter(spec: RateLimitSpec, children: Vec<Node>) -> Self {
        Node::Item(Component::RateLimiter { spec, children })
    }

    pub fn routes(directory: impl Into<String>) -> Self {
        Node::Item(Component::Routes {
            directory: directory.into(),
            children: Vec::new(),
        })
    }

    pub fn plugin(handler: PluginFn, props: Props, children: Vec<Node>) -> Self {
        Node::Item(Component::Plugin {
            handler,
            props,
            children,
        })
    }

    pub fn response(children: Vec<Node>) -> Self {
        Node::Item(Component::Response { children })
    }

    pub fn status(code: u16) -> Self {
        Node::Item(Component::Status { code })
    }

    pub fn body(value: Value) -> Self {
        Node::Item(Component::Body { value })
    }

    pub fn headers(map: BTreeMap<String, String>) -> Self {
        Node::Item(Component::Headers { map })
    }

    pub fn err(code: u16, message: impl Into<String>) -> Self {
        Node::Item(Component::Err {
            code,
            message: message.into(),
            details: None,
        })
    }

    pub fn err_with_details(code: u16, message: impl Into<String>, details: Value) -> Self {
        Node::Item(Component::Err {
            code,
            message: message.into(),
            details: Some(details),
        })
    }

    pub fn augment(fields: Props) -> Self {
        Node::Item(Component::Augment { fields })
    }

    pub fn halt(code: u16, message: impl Into<String>) -> Self {
        Node::Item(Component::Halt {
            code,
            message: message.into(),
        })
    }
}

impl From<Component> for Node {
    fn from(component: Component) -> Self {
        Node::Item(component)
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        Node::Value(value)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Empty => write!(f, "Empty"),
            Node::Value(v) => write!(f, "Value({v})"),
            Node::Fragment(children) => write!(f, "Fragment(len={})", children.len()),
            Node::Item(c) => write!(f, "Item({})", c.kind()),
            Node::Composite { children, .. } => {
                write!(f, "Composite(children={})", children.len())
            }
        }
    }
}

/// Wrap an async function as a `HandlerFn`.
pub fn handler<F, Fut>(f: F) -> HandlerFn
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<HandlerOutcome, HandlerError>> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}

/// Wrap an async function as a `MiddlewareFn`.
pub fn middleware_fn<F, Fut>(f: F) -> MiddlewareFn
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<MiddlewareOutcome, HandlerError>> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}

/// Wrap an async factory as a `ServiceProvider`.
pub fn provider<F, Fut>(f: F) -> ServiceProvider
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<ServiceHandle, BoxError>> + Send + 'static,
{
    Arc::new(move || Box::pin(f()))
}

/// Wrap a registration function as a `PluginFn`.
pub fn plugin_fn<F>(f: F) -> PluginFn
where
    F: Fn(&mut dyn HttpEngine, &Props, &RouteConfig) -> Result<(), BoxError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// Wrap a plain function as a `CompositeFn`.
pub fn composite_fn<F>(f: F) -> CompositeFn
where
    F: Fn(&Props, &[Node]) -> Node + Send + Sync + 'static,
{
    Arc::new(f)
}
