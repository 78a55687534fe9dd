//! Per-request handler context.
//!
//! # Responsibilities
//! - Carry parsed path params, query, body and headers into middleware
//!   and handlers
//! - Thread the opaque service handle from the merged RouteConfig
//! - Hold the fields contributed by Augment signals
//!
//! # Design Decisions
//! - Cheap to clone: middleware receive a snapshot, the pipeline owns the
//!   authoritative copy and applies augments between invocations

use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use axum::http::{HeaderMap, Method};
use serde_json::Value;

use crate::node::{Props, ServiceHandle};

/// Everything a middleware or handler sees about one request.
#[derive(Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub params: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Value,
    pub request_id: String,
    pub client: Option<IpAddr>,
    pub service: Option<ServiceHandle>,
    /// Fields contributed by Augment middleware signals.
    pub extras: Props,
}

impl RequestContext {
    /// Bare context for tests and non-HTTP invocation.
    pub fn empty(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: HashMap::new(),
            query: HashMap::new(),
            headers: HeaderMap::new(),
            body: Value::Null,
            request_id: String::new(),
            client: None,
            service: None,
            extras: Props::new(),
        }
    }

    /// Look up a path parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Look up a query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Look up an augmented field.
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extras.get(key)
    }

    /// Downcast the opaque service handle to a concrete type.
    pub fn service_as<T: std::any::Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.service.clone()?.downcast::<T>().ok()
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("params", &self.params)
            .field("request_id", &self.request_id)
            .field("client", &self.client)
            .field("service", &self.service.is_some())
            .field("extras", &self.extras)
            .finish()
    }
}
