use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::access::{
    AccessEntry, AccessError, AccessListReconciler, AccessResult, CreateAccessControl, RevokeEntry,
};
use crate::http::server::AppState;
use crate::route::StoreError;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

/// Optional filters for an access search.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub service: Option<String>,
    pub address: Option<String>,
}

impl IntoResponse for AccessError {
    fn into_response(self) -> Response {
        let status = match &self {
            AccessError::Validation(_) => StatusCode::BAD_REQUEST,
            AccessError::Parse(_) | AccessError::MalformedRule(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AccessError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            AccessError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Access request failed");
        } else {
            tracing::warn!(status = %status, error = %self, "Access request rejected");
        }

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

pub async fn get_status() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

/// Run a reconciler call on the blocking pool; store writes hit the disk.
async fn reconcile<T, F>(state: &AppState, op: F) -> AccessResult<T>
where
    F: FnOnce(&AccessListReconciler) -> AccessResult<T> + Send + 'static,
    T: Send + 'static,
{
    let reconciler = Arc::clone(&state.reconciler);
    tokio::task::spawn_blocking(move || op(&reconciler))
        .await
        .map_err(|e| AccessError::Store(StoreError::Io(std::io::Error::other(e))))?
}

pub async fn search_accesses(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<AccessEntry>>, AccessError> {
    let entries = reconcile(&state, move |reconciler| {
        reconciler.list(query.service.as_deref(), query.address.as_deref())
    })
    .await?;
    Ok(Json(entries))
}

pub async fn create_accesses(
    State(state): State<AppState>,
    Json(request): Json<CreateAccessControl>,
) -> Result<StatusCode, AccessError> {
    reconcile(&state, move |reconciler| {
        reconciler.grant(&request.services, &request.address_list(), request.allowed)
    })
    .await?;
    Ok(StatusCode::OK)
}

pub async fn delete_accesses(
    State(state): State<AppState>,
    Json(entries): Json<Vec<RevokeEntry>>,
) -> Result<StatusCode, AccessError> {
    reconcile(&state, move |reconciler| reconciler.revoke(&entries)).await?;
    Ok(StatusCode::OK)
}

pub async fn list_services(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.catalog.list_service_names())
}
