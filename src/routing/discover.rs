//! Route discovery and registration.
//!
//! # Responsibilities
//! - Walk a module source, build each route's config chain, merge it
//! - Register every exported method handler with the HTTP engine
//! - Produce the ordered RouteInfo table
//!
//! # Design Decisions
//! - Single deterministic pass: config modules first, then route modules,
//!   both in source order
//! - A module that fails to load or flatten is logged and skipped;
//!   discovery of siblings and descendants continues
//! - Route-module middleware is appended after every ancestor's

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::http::Method;

use crate::config::schema::RouteConfig;
use crate::http::engine::HttpEngine;
use crate::pipeline::CompiledRoute;
use crate::routing::merge::{apply_chain, flatten_config, ParsedConfig};
use crate::routing::paths;
use crate::routing::source::{ModuleExport, ModuleSource};

/// A discovered, fully resolved route.
#[derive(Debug, Clone)]
pub struct RouteInfo {
    /// Source file path relative to the routes directory.
    pub file: String,
    /// Final URL pattern.
    pub url: String,
    /// Methods registered for this file.
    pub methods: Vec<Method>,
    /// Merged, frozen configuration.
    pub config: Arc<RouteConfig>,
}

/// Discover every route under `directory` and register it with the engine.
///
/// `inherited` carries the walker's current config; its prefix is the
/// externally supplied prefix for every discovered route.
pub fn discover_and_register(
    source: &dyn ModuleSource,
    engine: &mut dyn HttpEngine,
    directory: &str,
    inherited: &RouteConfig,
) -> Vec<RouteInfo> {
    let files = source.list(directory);

    // Per-directory configs, keyed by directory relative to the routes root.
    let mut configs: BTreeMap<String, ParsedConfig> = BTreeMap::new();
    for rel in &files {
        if !paths::is_config_file(rel) {
            continue;
        }
        match source.load(directory, rel) {
            Ok(ModuleExport::Config(module)) => match flatten_config(&module.tree) {
                Ok(parsed) => {
                    configs.insert(parent_dir(rel).to_string(), parsed);
                }
                Err(err) => {
                    tracing::error!(file = %rel, error = %err, "Skipping config module");
                }
            },
            Ok(ModuleExport::Route(_)) => {
                tracing::error!(file = %rel, "Config file did not export a config tree; skipping");
            }
            Err(err) => {
                tracing::error!(file = %rel, error = %err, "Skipping config module");
            }
        }
    }

    let mut table = Vec::new();
    for rel in &files {
        if !paths::is_route_file(rel) {
            continue;
        }
        let module = match source.load(directory, rel) {
            Ok(ModuleExport::Route(module)) => module,
            Ok(ModuleExport::Config(_)) => {
                tracing::error!(file = %rel, "Route file exported a config tree; skipping");
                continue;
            }
            Err(err) => {
                tracing::error!(file = %rel, error = %err, "Skipping route module");
                continue;
            }
        };

        let chain: Vec<ParsedConfig> = ancestor_dirs(rel)
            .into_iter()
            .filter_map(|dir| configs.get(&dir).cloned())
            .collect();
        let mut config = apply_chain(inherited, &chain);
        for func in &module.middleware {
            config = config.with_middleware(func.clone());
        }

        let url = paths::join(&[&config.prefix, &paths::url_from_file(rel)]);
        let config = Arc::new(config);

        let mut methods = Vec::new();
        for (method, handler) in &module.handlers {
            let route = CompiledRoute::new(
                method.clone(),
                url.clone(),
                handler.clone(),
                config.clone(),
            );
            match engine.register(route) {
                Ok(()) => {
                    tracing::info!(method = %method, url = %url, file = %rel, "Route registered");
                    methods.push(method.clone());
                }
                Err(err) => {
                    tracing::error!(
                        method = %method,
                        url = %url,
                        file = %rel,
                        error = %err,
                        "Route registration failed"
                    );
                }
            }
        }

        if !methods.is_empty() {
            table.push(RouteInfo {
                file: rel.clone(),
                url,
                methods,
                config,
            });
        }
    }

    table
}

fn parent_dir(rel: &str) -> &str {
    rel.rfind('/').map_or("", |i| &rel[..i])
}

/// Ancestor directories of a file, root first: `a/b/c.rs` → `""`, `"a"`,
/// `"a/b"`.
fn ancestor_dirs(rel: &str) -> Vec<String> {
    let mut dirs = vec![String::new()];
    let parent = parent_dir(rel);
    if parent.is_empty() {
        return dirs;
    }
    let mut acc = String::new();
    for segment in parent.split('/') {
        if !acc.is_empty() {
            acc.push('/');
        }
        acc.push_str(segment);
        dirs.push(acc.clone());
    }
    dirs
}
