//! Module sources.
//!
//! # Responsibilities
//! - List route and config modules under a directory, in a stable order
//! - Load a module's exported bindings by path
//!
//! # Design Decisions
//! - Rust has no dynamic module loading: a source pairs structure (keys or
//!   a scanned directory) with registered bindings
//! - BTreeMap keys give the deterministic ordering discovery relies on
//! - Load failures are per-module errors, reported to the caller and never
//!   fatal to discovery

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use axum::http::Method;
use thiserror::Error;

use crate::node::{HandlerFn, MiddlewareFn, Node};
use crate::routing::paths;

/// A route module's exported bindings: one handler per HTTP method, plus
/// optional module-level middleware appended after every ancestor's.
#[derive(Clone, Default)]
pub struct RouteModule {
    pub handlers: Vec<(Method, HandlerFn)>,
    pub middleware: Vec<MiddlewareFn>,
}

impl RouteModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, method: Method, handler: HandlerFn) -> Self {
        self.handlers.push((method, handler));
        self
    }

    pub fn get(self, handler: HandlerFn) -> Self {
        self.on(Method::GET, handler)
    }

    pub fn post(self, handler: HandlerFn) -> Self {
        self.on(Method::POST, handler)
    }

    pub fn put(self, handler: HandlerFn) -> Self {
        self.on(Method::PUT, handler)
    }

    pub fn delete(self, handler: HandlerFn) -> Self {
        self.on(Method::DELETE, handler)
    }

    pub fn with_middleware(mut self, func: MiddlewareFn) -> Self {
        self.middleware.push(func);
        self
    }
}

/// A directory configuration module: its default-exported tree.
#[derive(Clone)]
pub struct ConfigModule {
    pub tree: Node,
}

/// What loading a module produced.
#[derive(Clone)]
pub enum ModuleExport {
    Route(RouteModule),
    Config(ConfigModule),
}

#[derive(Debug, Clone, Error)]
pub enum ModuleError {
    #[error("module not found: {0}")]
    NotFound(String),
    #[error("failed to load {path}: {reason}")]
    Load { path: String, reason: String },
}

/// The filesystem/module-loading collaborator.
pub trait ModuleSource: Send + Sync {
    /// File paths under `dir`, relative to `dir`, in a stable order.
    fn list(&self, dir: &str) -> Vec<String>;

    /// Load the module at `rel` under `dir`.
    fn load(&self, dir: &str, rel: &str) -> Result<ModuleExport, ModuleError>;
}

fn normalize_dir(dir: &str) -> &str {
    dir.trim_matches('/')
}

fn full_key(dir: &str, rel: &str) -> String {
    let dir = normalize_dir(dir);
    if dir.is_empty() {
        rel.to_string()
    } else {
        format!("{dir}/{rel}")
    }
}

/// In-code module registry keyed by extensionless relative paths, e.g.
/// `routes/health` or `routes/admin/_config`.
#[derive(Default)]
pub struct StaticModules {
    entries: BTreeMap<String, ModuleExport>,
}

impl StaticModules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route module under `path` (e.g. `routes/posts/[id]`).
    pub fn route(mut self, path: impl Into<String>, module: RouteModule) -> Self {
        self.entries
            .insert(path.into(), ModuleExport::Route(module));
        self
    }

    /// Register a directory configuration tree for `dir`.
    pub fn config(mut self, dir: impl Into<String>, tree: Node) -> Self {
        let dir = dir.into();
        let key = full_key(&dir, paths::CONFIG_BASENAME);
        self.entries
            .insert(key, ModuleExport::Config(ConfigModule { tree }));
        self
    }
}

impl ModuleSource for StaticModules {
    fn list(&self, dir: &str) -> Vec<String> {
        let dir = normalize_dir(dir);
        self.entries
            .keys()
            .filter_map(|key| {
                if dir.is_empty() {
                    Some(key.clone())
                } else {
                    key.strip_prefix(dir)
                        .and_then(|rest| rest.strip_prefix('/'))
                        .map(String::from)
                }
            })
            .collect()
    }

    fn load(&self, dir: &str, rel: &str) -> Result<ModuleExport, ModuleError> {
        let key = full_key(dir, paths::strip_extension(rel));
        self.entries
            .get(&key)
            .cloned()
            .ok_or(ModuleError::NotFound(key))
    }
}

/// A source whose structure comes from a real directory scan and whose
/// bindings come from an attached registry. Re-scanning an unchanged tree
/// yields an identical listing.
pub struct FsModules {
    root: PathBuf,
    bindings: StaticModules,
}

impl FsModules {
    pub fn new(root: impl Into<PathBuf>, bindings: StaticModules) -> Self {
        Self {
            root: root.into(),
            bindings,
        }
    }

    fn scan(&self, base: &Path, dir: &Path, out: &mut Vec<String>) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::error!(dir = %dir.display(), error = %err, "Failed to read directory");
                return;
            }
        };
        let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok()).map(|e| e.path()).collect();
        paths.sort();
        for path in paths {
            if path.is_dir() {
                self.scan(base, &path, out);
            } else if let Ok(rel) = path.strip_prefix(base) {
                out.push(rel.to_string_lossy().replace('\\', "/"));
            }
        }
    }
}

impl ModuleSource for FsModules {
    fn list(&self, dir: &str) -> Vec<String> {
        let base = self.root.join(normalize_dir(dir));
        let mut out = Vec::new();
        self.scan(&base, &base, &mut out);
        out.sort();
        out
    }

    fn load(&self, dir: &str, rel: &str) -> Result<ModuleExport, ModuleError> {
        self.bindings.load(dir, rel)
    }
}
