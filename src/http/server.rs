//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Assemble the store, normalizer, catalog and reconciler from config
//! - Create the Axum Router with all admin handlers
//! - Wire up middleware (tracing, limits, request ID)
//! - Serve until the shutdown signal fires

use axum::Router;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::access::{AccessListReconciler, HostNormalizer};
use crate::admin::setup_admin_router;
use crate::catalog::{ServiceCatalog, StaticServiceCatalog};
use crate::config::AdminConfig;
use crate::route::{InMemoryRouteStore, StoreResult};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub reconciler: Arc<AccessListReconciler>,
    pub catalog: Arc<dyn ServiceCatalog>,
}

impl AppState {
    /// Build the default collaborators described by `config`.
    pub fn from_config(config: &AdminConfig) -> StoreResult<Self> {
        let store = match &config.store.path {
            Some(path) => InMemoryRouteStore::load_from_file(Path::new(path))?,
            None => InMemoryRouteStore::new(None),
        };
        let normalizer = HostNormalizer::new(config.access.default_address.clone());
        let catalog = StaticServiceCatalog::new(config.catalog.services.clone());

        Ok(Self {
            reconciler: Arc::new(AccessListReconciler::new(Arc::new(store), Arc::new(normalizer))),
            catalog: Arc::new(catalog),
        })
    }
}

/// HTTP server for the access admin API.
pub struct AdminServer {
    router: Router,
    config: AdminConfig,
}

impl AdminServer {
    /// Create a server over an already assembled state.
    pub fn new(config: AdminConfig, state: AppState) -> Self {
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Create a server with the collaborators `config` describes.
    pub fn from_config(config: AdminConfig) -> StoreResult<Self> {
        let state = AppState::from_config(&config)?;
        Ok(Self::new(config, state))
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AdminConfig, state: AppState) -> Router {
        setup_admin_router(state)
            .layer(RequestBodyLimitLayer::new(config.server.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until a value arrives on `shutdown`.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            max_body_size = self.config.server.max_body_size,
            "Admin server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("Admin server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AdminConfig {
        &self.config
    }
}
