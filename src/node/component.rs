//! Tagged component kinds.
//!
//! # Responsibilities
//! - Define the closed set of component kinds and their payloads
//! - Expose uniform child access for the walker and resolver
//!
//! # Design Decisions
//! - Explicit enum instead of marker-object identity: new kinds are
//!   compiler-checked at every match site
//! - Constructed once at startup, immutable thereafter

use std::collections::BTreeMap;
use std::fmt;

use axum::http::Method;
use serde_json::Value;

use super::{HandlerFn, MiddlewareFn, Node, PluginFn, Props, ServiceProvider};
use crate::config::schema::{CorsSpec, LogLevel, RateLimitSpec};

/// A resolved, tagged configuration unit.
#[derive(Clone)]
pub enum Component {
    /// Tree root. Invalid anywhere else.
    Server { children: Vec<Node> },
    /// A single HTTP route.
    Route {
        method: Method,
        path: String,
        handler: HandlerFn,
        schema: Option<Value>,
    },
    /// Appends a middleware to the propagated config for its subtree.
    Middleware {
        func: MiddlewareFn,
        children: Vec<Node>,
    },
    /// Awaits an external service provider and threads its handle down.
    Db {
        provider: ServiceProvider,
        children: Vec<Node>,
    },
    /// Sets the host log threshold and the subtree's log level.
    Logger {
        level: LogLevel,
        children: Vec<Node>,
    },
    /// Concatenates a path prefix for its subtree.
    Group { prefix: String, children: Vec<Node> },
    /// Registers CORS support and propagates the spec.
    Cors { spec: CorsSpec, children: Vec<Node> },
    /// Propagates a rate-limit spec enforced per request.
    RateLimiter {
        spec: RateLimitSpec,
        children: Vec<Node>,
    },
    /// Delegates a directory to the file-based router.
    Routes {
        directory: String,
        children: Vec<Node>,
    },
    /// Mounts an external add-on. Failures are logged, non-fatal.
    Plugin {
        handler: PluginFn,
        props: Props,
        children: Vec<Node>,
    },
    /// Root of a response-descriptor tree.
    Response { children: Vec<Node> },
    /// Response status code (last write wins).
    Status { code: u16 },
    /// Response body (last write wins).
    Body { value: Value },
    /// Response headers (merged key by key).
    Headers { map: BTreeMap<String, String> },
    /// Terminal error descriptor.
    Err {
        code: u16,
        message: String,
        details: Option<Value>,
    },
    /// Middleware signal: merge fields into the handler context.
    Augment { fields: Props },
    /// Middleware signal: stop the chain with a status and message.
    Halt { code: u16, message: String },
}

impl Component {
    /// Kind name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Component::Server { .. } => "Server",
            Component::Route { .. } => "Route",
            Component::Middleware { .. } => "Middleware",
            Component::Db { .. } => "Db",
            Component::Logger { .. } => "Logger",
            Component::Group { .. } => "Group",
            Component::Cors { .. } => "Cors",
            Component::RateLimiter { .. } => "RateLimiter",
            Component::Routes { .. } => "Routes",
            Component::Plugin { .. } => "Plugin",
            Component::Response { .. } => "Response",
            Component::Status { .. } => "Status",
            Component::Body { .. } => "Body",
            Component::Headers { .. } => "Headers",
            Component::Err { .. } => "Err",
            Component::Augment { .. } => "Augment",
            Component::Halt { .. } => "Halt",
        }
    }

    /// Child nodes scoped under this component, empty for leaf kinds.
    pub fn children(&self) -> &[Node] {
        match self {
            Component::Server { children }
            | Component::Middleware { children, .. }
            | Component::Db { children, .. }
            | Component::Logger { children, .. }
            | Component::Group { children, .. }
            | Component::Cors { children, .. }
            | Component::RateLimiter { children, .. }
            | Component::Routes { children, .. }
            | Component::Plugin { children, .. }
            | Component::Response { children } => children,
            Component::Route { .. }
            | Component::Status { .. }
            | Component::Body { .. }
            | Component::Headers { .. }
            | Component::Err { .. }
            | Component::Augment { .. }
            | Component::Halt { .. } => &[],
        }
    }

    pub fn has_children(&self) -> bool {
        !self.children().is_empty()
    }

    /// Replace this component's children. Leaf kinds are returned unchanged;
    /// used by the resolver to re-attach a composite's children onto a
    /// transparent wrapper.
    pub(crate) fn with_children(self, new_children: Vec<Node>) -> Self {
        match self {
            Component::Server { .. } => Component::Server {
                children: new_children,
            },
            Component::Middleware { func, .. } => Component::Middleware {
                func,
                children: new_children,
            },
            Component::Db { provider, .. } => Component::Db {
                provider,
                children: new_children,
            },
            Component::Logger { level, .. } => Component::Logger {
                level,
                children: new_children,
            },
            Component::Group { prefix, .. } => Component::Group {
                prefix,
                children: new_children,
            },
            Component::Cors { spec, .. } => Component::Cors {
                spec,
                children: new_children,
            },
            Component::RateLimiter { spec, .. } => Component::RateLimiter {
                spec,
                children: new_children,
            },
            Component::Routes { directory, .. } => Component::Routes {
                directory,
                children: new_children,
            },
            Component::Plugin { handler, props, .. } => Component::Plugin {
                handler,
                props,
                children: new_children,
            },
            Component::Response { .. } => Component::Response {
                children: new_children,
            },
            other => other,
        }
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Route { method, path, .. } => write!(f, "Route({method} {path})"),
            Component::Group { prefix, .. } => write!(f, "Group({prefix})"),
            Component::Routes { directory, .. } => write!(f, "Routes({directory})"),
            Component::Status { code } => write!(f, "Status({code})"),
            Component::Halt { code, .. } => write!(f, "Halt({code})"),
            Component::Err { code, .. } => write!(f, "Err({code})"),
            other => write!(f, "{}", other.kind()),
        }
    }
}
