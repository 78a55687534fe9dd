//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve listen options (CLI over environment over defaults)
//! - Initialize logging, boot the tree against an engine, bind the listener
//! - Wire Ctrl-C to graceful shutdown
//!
//! # Design Decisions
//! - Fail fast: a rejected service provider or failed bind aborts startup
//! - The tree boots fully before the socket binds, so traffic never
//!   arrives on a half-registered route table

use std::net::SocketAddr;
use std::process::Command;

use clap::Parser;
use tokio::net::TcpListener;

use crate::config::schema::LogLevel;
use crate::http::server::AxumEngine;
use crate::node::Node;
use crate::observability::logging;
use crate::routing::source::ModuleSource;
use crate::tree::{boot, BootError};

use super::shutdown::Shutdown;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;

/// Command-line flags accepted by a hosted server binary.
#[derive(Debug, Parser, Default)]
#[command(about = "Declarative tree-to-server runtime")]
pub struct CliArgs {
    /// Interface to bind.
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind.
    #[arg(long)]
    pub port: Option<u16>,

    /// Open the served address in the default browser after bind.
    #[arg(long, default_value_t = false)]
    pub open: bool,
}

/// Resolved listen settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenOptions {
    pub host: String,
    pub port: u16,
    pub open: bool,
}

impl Default for ListenOptions {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            open: false,
        }
    }
}

impl ListenOptions {
    /// CLI flags win over `CANOPY_HOST` / `CANOPY_PORT`, which win over
    /// the defaults. Unparseable environment values are logged and ignored.
    pub fn resolve(cli: &CliArgs) -> Self {
        let env_host = std::env::var("CANOPY_HOST").ok();
        let env_port = std::env::var("CANOPY_PORT").ok().and_then(|raw| {
            raw.parse::<u16>()
                .map_err(|_| {
                    tracing::warn!(value = %raw, "Ignoring unparseable CANOPY_PORT");
                })
                .ok()
        });

        Self {
            host: cli
                .host
                .clone()
                .or(env_host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(env_port).unwrap_or(DEFAULT_PORT),
            open: cli.open,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Boot the tree against a fresh axum engine without binding a socket.
///
/// Useful for tests and for embedding; `run` is the full entry point.
pub async fn boot_engine(
    root: &Node,
    source: &dyn ModuleSource,
) -> Result<AxumEngine, BootError> {
    let mut engine = AxumEngine::new();
    boot(root, &mut engine, source).await?;
    Ok(engine)
}

/// Boot, bind and serve until Ctrl-C.
pub async fn run(
    root: &Node,
    source: &dyn ModuleSource,
    opts: ListenOptions,
) -> Result<(), BootError> {
    logging::init(LogLevel::Info);

    let engine = boot_engine(root, source).await?;
    let listener = TcpListener::bind(opts.bind_address()).await?;
    let addr = listener.local_addr()?;

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    shutdown.trigger_on_ctrl_c();

    if opts.open {
        open_browser(&addr);
    }

    engine.serve(listener, receiver).await?;
    Ok(())
}

/// Best effort: failure to spawn the opener never affects the server.
fn open_browser(addr: &SocketAddr) {
    let target = format!("http://{addr}");

    #[cfg(target_os = "macos")]
    let result = Command::new("open").arg(&target).spawn();
    #[cfg(target_os = "windows")]
    let result = Command::new("cmd").args(["/C", "start", &target]).spawn();
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let result = Command::new("xdg-open").arg(&target).spawn();

    match result {
        Ok(_) => tracing::info!(url = %target, "Opened browser"),
        Err(err) => tracing::warn!(url = %target, error = %err, "Could not open browser"),
    }
}
