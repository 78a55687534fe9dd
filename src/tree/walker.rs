//! Config propagation and registration walk.
//!
//! # Responsibilities
//! - Resolve each node and dispatch on its kind
//! - Maintain the immutable-per-branch RouteConfig
//! - Drive engine registration and file-router discovery
//!
//! # Design Decisions
//! - Every override is copy-with-override; sibling branches cannot
//!   observe each other
//! - Db rejection aborts the boot; Cors/Plugin/route failures are logged
//!   and the walk continues so remaining routes still register

use std::sync::Arc;

use futures_util::future::LocalBoxFuture;
use thiserror::Error;

use crate::config::schema::RouteConfig;
use crate::http::engine::HttpEngine;
use crate::node::{resolve, Component, Node, Resolved};
use crate::observability::logging;
use crate::pipeline::CompiledRoute;
use crate::routing::discover::discover_and_register;
use crate::routing::paths;
use crate::routing::source::ModuleSource;
use crate::security::sanitize::sanitize_error_message;

#[derive(Debug, Error)]
pub enum BootError {
    #[error("root node must resolve to a Server component")]
    InvalidRoot,
    #[error("service provider failed: {0}")]
    Service(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Walk the whole tree once, registering everything against the engine.
///
/// Fails fast if the root does not resolve to a Server component.
pub async fn boot(
    root: &Node,
    engine: &mut dyn HttpEngine,
    source: &dyn ModuleSource,
) -> Result<(), BootError> {
    let resolved = resolve(root).map_err(|err| {
        tracing::error!(error = %err, "Root node failed to resolve");
        BootError::InvalidRoot
    })?;
    match resolved {
        Resolved::Item(Component::Server { children }) => {
            for child in &children {
                walk(child, engine, source, RouteConfig::default()).await?;
            }
            Ok(())
        }
        _ => Err(BootError::InvalidRoot),
    }
}

/// Depth-first walk of one subtree under `config`.
fn walk<'a>(
    node: &'a Node,
    engine: &'a mut dyn HttpEngine,
    source: &'a dyn ModuleSource,
    config: RouteConfig,
) -> LocalBoxFuture<'a, Result<(), BootError>> {
    Box::pin(async move {
        let resolved = match resolve(node) {
            Ok(resolved) => resolved,
            Err(err) => {
                tracing::error!(error = %err, "Skipping unresolvable node");
                return Ok(());
            }
        };

        match resolved {
            Resolved::None => Ok(()),
            Resolved::Fragment(children) => {
                for child in &children {
                    walk(child, engine, source, config.clone()).await?;
                }
                Ok(())
            }
            Resolved::Item(component) => match component {
                Component::Server { children } => {
                    tracing::warn!("Nested Server node has no effect");
                    for child in &children {
                        walk(child, engine, source, config.clone()).await?;
                    }
                    Ok(())
                }
                Component::Logger { level, children } => {
                    logging::set_level(level);
                    let next = config.with_log_level(level);
                    for child in &children {
                        walk(child, engine, source, next.clone()).await?;
                    }
                    Ok(())
                }
                Component::Db { provider, children } => {
                    // awaited before any deeper node: downstream routes may
                    // assume the handle exists
                    let handle = provider().await.map_err(|err| {
                        BootError::Service(sanitize_error_message(
                            &err.to_string(),
                            "service provider rejected",
                        ))
                    })?;
                    tracing::info!("Service handle resolved");
                    let next = config.with_service(handle);
                    for child in &children {
                        walk(child, engine, source, next.clone()).await?;
                    }
                    Ok(())
                }
                Component::Cors { spec, children } => {
                    if let Err(err) = engine.enable_cors(&spec) {
                        tracing::error!(error = %err, "CORS registration failed");
                    }
                    let next = config.with_cors(spec);
                    for child in &children {
                        walk(child, engine, source, next.clone()).await?;
                    }
                    Ok(())
                }
                Component::RateLimiter { spec, children } => {
                    let next = config.with_rate_limit(spec);
                    for child in &children {
                        walk(child, engine, source, next.clone()).await?;
                    }
                    Ok(())
                }
                Component::Middleware { func, children } => {
                    let next = config.with_middleware(func);
                    for child in &children {
                        walk(child, engine, source, next.clone()).await?;
                    }
                    Ok(())
                }
                Component::Group { prefix, children } => {
                    let next = config.with_prefix(&prefix);
                    for child in &children {
                        walk(child, engine, source, next.clone()).await?;
                    }
                    Ok(())
                }
                Component::Routes {
                    directory,
                    children,
                } => {
                    let discovered = discover_and_register(source, engine, &directory, &config);
                    tracing::info!(
                        directory = %directory,
                        routes = discovered.len(),
                        "Directory routes registered"
                    );
                    for child in &children {
                        walk(child, engine, source, config.clone()).await?;
                    }
                    Ok(())
                }
                Component::Plugin {
                    handler,
                    props,
                    children,
                } => {
                    match handler(engine, &props, &config) {
                        Ok(()) => tracing::info!("Plugin registered"),
                        Err(err) => tracing::error!(error = %err, "Plugin registration failed"),
                    }
                    // config forwarded unchanged
                    for child in &children {
                        walk(child, engine, source, config.clone()).await?;
                    }
                    Ok(())
                }
                Component::Route {
                    method,
                    path,
                    handler,
                    schema,
                } => {
                    let url = paths::join(&[&config.prefix, &path]);
                    let mut route = CompiledRoute::new(
                        method.clone(),
                        url.clone(),
                        handler,
                        Arc::new(config.clone()),
                    );
                    route.schema = schema;
                    match engine.register(route) {
                        Ok(()) => {
                            tracing::info!(method = %method, url = %url, "Route registered");
                        }
                        Err(err) => {
                            tracing::error!(
                                method = %method,
                                url = %url,
                                error = %err,
                                "Route registration failed"
                            );
                        }
                    }
                    Ok(())
                }
                Component::Response { children } => {
                    // descriptor kinds are inert at boot
                    for child in &children {
                        walk(child, engine, source, config.clone()).await?;
                    }
                    Ok(())
                }
                Component::Status { .. }
                | Component::Body { .. }
                | Component::Headers { .. }
                | Component::Err { .. }
                | Component::Augment { .. }
                | Component::Halt { .. } => Ok(()),
            },
        }
    })
}
