//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Allow Logger nodes to retarget the host threshold at boot
//!
//! # Design Decisions
//! - `RUST_LOG` takes precedence over the code-supplied default level
//! - Re-initialization is a no-op (tests boot many trees per process)

use std::sync::OnceLock;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, EnvFilter, Registry};

use crate::config::schema::LogLevel;

static RELOAD_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

/// Initialize the tracing subscriber with a reloadable level filter.
pub fn init(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter()));
    let (filter, handle) = reload::Layer::new(filter);

    let initialized = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok();

    if initialized {
        let _ = RELOAD_HANDLE.set(handle);
    }
}

/// Retarget the host log threshold. Called by the walker for Logger nodes.
pub fn set_level(level: LogLevel) {
    match RELOAD_HANDLE.get() {
        Some(handle) => {
            if handle.reload(EnvFilter::new(level.as_filter())).is_err() {
                tracing::warn!(level = level.as_filter(), "Failed to update log threshold");
            }
        }
        None => {
            tracing::debug!(
                level = level.as_filter(),
                "Log threshold requested before subscriber init"
            );
        }
    }
}
