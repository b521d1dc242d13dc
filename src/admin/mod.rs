//! Admin API for access lists.
//!
//! # Endpoints
//! - `GET  /admin/status`
//! - `GET  /api/accesses/search?service=&address=`
//! - `POST /api/accesses/create`
//! - `POST /api/accesses/delete`
//! - `GET  /api/accesses/services`
//!
//! Reconciler calls run on the blocking pool since store writes do file I/O.

pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use crate::http::server::AppState;
use self::handlers::*;

pub fn setup_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/api/accesses/search", get(search_accesses))
        .route("/api/accesses/create", post(create_accesses))
        .route("/api/accesses/delete", post(delete_accesses))
        .route("/api/accesses/services", get(list_services))
        .with_state(state)
}
