//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use access_admin::{AdminConfig, AdminServer, Shutdown};

/// A running admin server on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<()>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the server task to finish.
    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = self.handle.await;
    }
}

/// Start a server for `config`, ignoring its bind address.
pub async fn start_server(config: AdminConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = AdminServer::from_config(config).unwrap();
    let shutdown = Shutdown::new();
    let stop = shutdown.subscribe();

    let handle = tokio::spawn(async move {
        server.run(listener, stop).await.unwrap();
    });

    TestServer { addr, shutdown, handle }
}

/// A per-process scratch file path, removed if it already exists.
#[allow(dead_code)]
pub fn scratch_file(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("{}_{}.json", name, std::process::id()));
    let _ = std::fs::remove_file(&path);
    path
}
