//! Configuration value types.
//!
//! This module defines the propagated configuration record and the specs
//! carried by Cors, RateLimiter and Logger nodes. Spec types derive Serde
//! traits so they can be built from data as well as code.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::node::{MiddlewareFn, ServiceHandle};

/// Host log threshold levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Directive string accepted by the tracing env filter.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Rate-limit spec: at most `max` requests per `window_secs` window.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitSpec {
    pub max: u32,
    pub window_secs: u64,
}

impl Default for RateLimitSpec {
    fn default() -> Self {
        Self {
            max: 60,
            window_secs: 60,
        }
    }
}

/// CORS spec propagated to the HTTP engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsSpec {
    /// Allowed origin; `*` means any.
    pub allow_origin: String,

    /// Allowed methods; empty means any.
    pub allow_methods: Vec<String>,

    /// Allowed request headers; empty means any.
    pub allow_headers: Vec<String>,
}

impl Default for CorsSpec {
    fn default() -> Self {
        Self {
            allow_origin: "*".to_string(),
            allow_methods: Vec::new(),
            allow_headers: Vec::new(),
        }
    }
}

/// The propagated, tree-scoped configuration record.
///
/// Every override produces a new value; a parent's instance is never
/// mutated in place, so sibling branches cannot observe each other.
#[derive(Clone, Default)]
pub struct RouteConfig {
    /// Ordered middleware list, root-to-leaf.
    pub middleware: Vec<ScopedMiddleware>,

    /// Concatenative path prefix.
    pub prefix: String,

    /// Rate-limit spec; most specific setter wins.
    pub rate_limit: Option<RateLimitSpec>,

    /// CORS spec; most specific setter wins.
    pub cors: Option<CorsSpec>,

    /// Log level; most specific setter wins.
    pub log_level: Option<LogLevel>,

    /// Opaque service handle supplied by an external provider.
    pub service: Option<ServiceHandle>,

    /// Open extension map for forward-compatible fields.
    pub extensions: BTreeMap<String, Value>,
}

impl RouteConfig {
    pub fn with_log_level(&self, level: LogLevel) -> Self {
        let mut next = self.clone();
        next.log_level = Some(level);
        next
    }

    pub fn with_service(&self, handle: ServiceHandle) -> Self {
        let mut next = self.clone();
        next.service = Some(handle);
        next
    }

    pub fn with_cors(&self, spec: CorsSpec) -> Self {
        let mut next = self.clone();
        next.cors = Some(spec);
        next
    }

    pub fn with_rate_limit(&self, spec: RateLimitSpec) -> Self {
        let mut next = self.clone();
        next.rate_limit = Some(spec);
        next
    }

    /// Concatenate a prefix segment onto the existing prefix.
    pub fn with_prefix(&self, segment: &str) -> Self {
        let mut next = self.clone();
        next.prefix.push_str(segment);
        next
    }

    /// Append a middleware paired with a snapshot of the config in effect
    /// at its definition point (taken before the append).
    pub fn with_middleware(&self, func: MiddlewareFn) -> Self {
        let scope = self.snapshot();
        let mut next = self.clone();
        next.middleware.push(ScopedMiddleware { func, scope });
        next
    }

    pub fn with_extension(&self, key: impl Into<String>, value: Value) -> Self {
        let mut next = self.clone();
        next.extensions.insert(key.into(), value);
        next
    }

    /// Immutable snapshot of everything except the middleware list.
    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            prefix: self.prefix.clone(),
            rate_limit: self.rate_limit.clone(),
            cors: self.cors.clone(),
            log_level: self.log_level,
            service: self.service.clone(),
            extensions: self.extensions.clone(),
        }
    }
}

impl fmt::Debug for RouteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteConfig")
            .field("middleware", &self.middleware.len())
            .field("prefix", &self.prefix)
            .field("rate_limit", &self.rate_limit)
            .field("cors", &self.cors)
            .field("log_level", &self.log_level)
            .field("service", &self.service.is_some())
            .field("extensions", &self.extensions)
            .finish()
    }
}

/// The config in effect at a middleware's definition point, excluding the
/// middleware list itself (no self-reference).
#[derive(Clone, Default)]
pub struct ConfigSnapshot {
    pub prefix: String,
    pub rate_limit: Option<RateLimitSpec>,
    pub cors: Option<CorsSpec>,
    pub log_level: Option<LogLevel>,
    pub service: Option<ServiceHandle>,
    pub extensions: BTreeMap<String, Value>,
}

impl fmt::Debug for ConfigSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigSnapshot")
            .field("prefix", &self.prefix)
            .field("rate_limit", &self.rate_limit)
            .field("log_level", &self.log_level)
            .field("service", &self.service.is_some())
            .finish()
    }
}

/// A middleware function paired with its definition-site snapshot.
#[derive(Clone)]
pub struct ScopedMiddleware {
    pub func: MiddlewareFn,
    pub scope: ConfigSnapshot,
}

impl fmt::Debug for ScopedMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedMiddleware")
            .field("scope", &self.scope)
            .finish()
    }
}
