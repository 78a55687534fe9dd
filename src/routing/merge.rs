//! Directory config flattening and chain merging.
//!
//! # Responsibilities
//! - Evaluate a config module's exported tree into a flat ParsedConfig
//! - Apply a root-to-leaf chain of ParsedConfigs onto an inherited config
//!
//! # Design Decisions
//! - Flattening accepts Logger/Middleware/RateLimiter/Group/Cors nodes;
//!   other kinds are recursed through, route kinds are meaningless here
//! - Merge policy: middleware and prefix are additive, rate limit,
//!   log level and CORS are override (most specific ancestor wins)

use crate::config::schema::{CorsSpec, LogLevel, RateLimitSpec, RouteConfig};
use crate::node::{resolve, Component, MiddlewareFn, Node, Resolved, ResolveError};

/// The flattened result of evaluating one directory's config module.
#[derive(Clone, Default)]
pub struct ParsedConfig {
    pub middleware: Vec<MiddlewareFn>,
    pub rate_limit: Option<RateLimitSpec>,
    pub log_level: Option<LogLevel>,
    pub prefix: String,
    pub cors: Option<CorsSpec>,
}

/// Flatten a config module's tree.
pub fn flatten_config(tree: &Node) -> Result<ParsedConfig, ResolveError> {
    let mut out = ParsedConfig::default();
    collect(tree, &mut out)?;
    Ok(out)
}

fn collect(node: &Node, out: &mut ParsedConfig) -> Result<(), ResolveError> {
    match resolve(node)? {
        Resolved::None => {}
        Resolved::Fragment(children) => {
            for child in &children {
                collect(child, out)?;
            }
        }
        Resolved::Item(component) => match component {
            Component::Logger { level, children } => {
                out.log_level = Some(level);
                for child in &children {
                    collect(child, out)?;
                }
            }
            Component::Middleware { func, children } => {
                out.middleware.push(func);
                for child in &children {
                    collect(child, out)?;
                }
            }
            Component::RateLimiter { spec, children } => {
                out.rate_limit = Some(spec);
                for child in &children {
                    collect(child, out)?;
                }
            }
            Component::Group { prefix, children } => {
                out.prefix.push_str(&prefix);
                for child in &children {
                    collect(child, out)?;
                }
            }
            Component::Cors { spec, children } => {
                out.cors = Some(spec);
                for child in &children {
                    collect(child, out)?;
                }
            }
            other => {
                // forward-compatible passthrough
                for child in other.children() {
                    collect(child, out)?;
                }
            }
        },
    }
    Ok(())
}

/// Apply a root-to-leaf config chain onto an inherited config.
pub fn apply_chain(inherited: &RouteConfig, chain: &[ParsedConfig]) -> RouteConfig {
    let mut config = inherited.clone();
    for parsed in chain {
        if let Some(level) = parsed.log_level {
            config = config.with_log_level(level);
        }
        if let Some(spec) = &parsed.rate_limit {
            config = config.with_rate_limit(spec.clone());
        }
        if let Some(spec) = &parsed.cors {
            config = config.with_cors(spec.clone());
        }
        if !parsed.prefix.is_empty() {
            config = config.with_prefix(&parsed.prefix);
        }
        for func in &parsed.middleware {
            config = config.with_middleware(func.clone());
        }
    }
    config
}
