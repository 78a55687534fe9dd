//! Shared helpers for end-to-end tests.

use std::net::SocketAddr;

use canopy::routing::source::ModuleSource;
use canopy::{boot_engine, BootError, Node, Shutdown, StaticModules};
use tokio::net::TcpListener;

/// Boot `root` against an ephemeral port and serve it in the background.
///
/// Returns the bound address and the shutdown handle. Dropping the handle
/// without triggering leaves the task running until the test process exits.
pub async fn spawn_server(
    root: Node,
    source: impl ModuleSource + Send + Sync + 'static,
) -> Result<(SocketAddr, Shutdown), BootError> {
    let engine = boot_engine(&root, &source).await?;

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        if let Err(err) = engine.serve(listener, receiver).await {
            eprintln!("test server failed: {err}");
        }
    });

    Ok((addr, shutdown))
}

pub async fn spawn(root: Node) -> (SocketAddr, Shutdown) {
    spawn_server(root, StaticModules::new())
        .await
        .expect("server should boot")
}
