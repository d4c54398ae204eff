//! API routes for the tracker server.

pub mod analyses;
pub mod catalog;
pub mod devices;
pub mod firmware;
pub mod resources;
pub mod tracker;

use axum::{routing::get, Json, Router};
use embark_core::DeletionOutcome;
use serde::Serialize;
use uuid::Uuid;

use crate::state::AppState;

/// Response of a delete: the removed record and what happened to its storage.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub id: Uuid,
    pub cleanup: DeletionOutcome,
}

/// Creates the main API router with all routes mounted.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_v1_routes(state))
}

/// Creates the v1 API routes.
fn api_v1_routes(state: AppState) -> Router {
    Router::new()
        .route("/version", get(version))
        .nest("/analyses", analyses::router(state.clone()))
        .nest("/devices", devices::router(state.clone()))
        .nest("/vendors", catalog::vendors_router(state.clone()))
        .nest("/labels", catalog::labels_router(state.clone()))
        .nest("/firmware", firmware::router(state.clone()))
        .nest("/tracker", tracker::router(state.clone()))
        .nest("/resources", resources::router(state))
}

async fn health_check() -> &'static str {
    "ok"
}

#[derive(Serialize)]
struct VersionResponse {
    version: &'static str,
}

/// GET /api/v1/version
async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
    })
}
