//! Vendor and label catalog endpoints.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Label, NewLabel, NewVendor, Vendor};
use crate::state::AppState;

pub fn vendors_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(create_vendor).get(list_vendors))
        .with_state(state)
}

pub fn labels_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(create_label).get(list_labels))
        .with_state(state)
}

/// POST /api/v1/vendors
async fn create_vendor(
    State(state): State<AppState>,
    Json(req): Json<NewVendor>,
) -> Result<(StatusCode, Json<Vendor>), AppError> {
    req.validate().map_err(AppError::BadRequest)?;

    let vendor: Vendor = sqlx::query_as(
        "INSERT INTO vendors (id, vendor_name) VALUES ($1, $2) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&req.vendor_name)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| AppError::from_insert(e, "Vendor"))?;

    tracing::info!("Created vendor {}", vendor);
    Ok((StatusCode::CREATED, Json(vendor)))
}

/// GET /api/v1/vendors
async fn list_vendors(State(state): State<AppState>) -> Result<Json<Vec<Vendor>>, AppError> {
    let vendors = sqlx::query_as("SELECT * FROM vendors ORDER BY vendor_name")
        .fetch_all(&state.pool)
        .await?;
    Ok(Json(vendors))
}

/// POST /api/v1/labels
async fn create_label(
    State(state): State<AppState>,
    Json(req): Json<NewLabel>,
) -> Result<(StatusCode, Json<Label>), AppError> {
    req.validate().map_err(AppError::BadRequest)?;

    let label: Label =
        sqlx::query_as("INSERT INTO labels (id, label_name) VALUES ($1, $2) RETURNING *")
            .bind(Uuid::new_v4())
            .bind(&req.label_name)
            .fetch_one(&state.pool)
            .await
            .map_err(|e| AppError::from_insert(e, "Label"))?;

    Ok((StatusCode::CREATED, Json(label)))
}

/// GET /api/v1/labels
async fn list_labels(State(state): State<AppState>) -> Result<Json<Vec<Label>>, AppError> {
    let labels = sqlx::query_as("SELECT * FROM labels ORDER BY label_name")
        .fetch_all(&state.pool)
        .await?;
    Ok(Json(labels))
}
