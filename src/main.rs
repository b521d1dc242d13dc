//! Access list admin server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Admin request            ┌──────────────────────────────────────────────┐
//!     ─────────────────────────┼─▶ http::server ──▶ admin::handlers          │
//!                              │                        │                     │
//!                              │                        ▼                     │
//!                              │            access::AccessListReconciler      │
//!                              │               │                  │           │
//!                              │               ▼                  ▼           │
//!                              │        rule::condition     route::RouteStore │
//!                              │        (decode/encode)     (find/create/     │
//!                              │                             update/delete)   │
//!                              └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use access_admin::config::{load_config, AdminConfig};
use access_admin::observability::{logging, metrics};
use access_admin::{AdminServer, Shutdown};

#[derive(Parser)]
#[command(name = "access-admin")]
#[command(about = "Black/white list administration for service routes", long_about = None)]
struct Args {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => AdminConfig::default(),
    };

    logging::init(&config.observability.log_level);
    tracing::info!("access-admin v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        config = ?args.config,
        bind_address = %config.server.bind_address,
        store = ?config.store.path,
        services = config.catalog.services.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = AdminServer::from_config(config)?;
    let shutdown = Shutdown::new();
    let stop = shutdown.subscribe();
    shutdown.trigger_on_signal();

    server.run(listener, stop).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
