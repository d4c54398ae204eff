//! Device endpoints, including the per-device result report.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{AnalysisResult, Device, DeviceWithVendor, FirmwareAnalysis, NewDevice};
use crate::state::AppState;
use crate::tracker::{build_device_report, DeviceReport};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(create_device).get(list_devices))
        .route("/{id}/visibility", post(toggle_visibility))
        .route("/{id}/report", get(device_report))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct ListDevicesQuery {
    /// Only devices added at or after this instant.
    pub since: Option<DateTime<Utc>>,
    #[serde(default)]
    pub include_hidden: bool,
}

#[derive(Debug, Deserialize)]
pub struct ToggleVisibilityRequest {
    pub user_id: Uuid,
}

async fn fetch_device(pool: &PgPool, id: Uuid) -> Result<Device, AppError> {
    sqlx::query_as("SELECT * FROM devices WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Device {} not found", id)))
}

/// POST /api/v1/devices
async fn create_device(
    State(state): State<AppState>,
    Json(req): Json<NewDevice>,
) -> Result<(StatusCode, Json<Device>), AppError> {
    req.validate().map_err(AppError::BadRequest)?;

    let device: Device = sqlx::query_as(
        r#"
        INSERT INTO devices (id, device_name, device_vendor_id, device_label_id, device_user_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&req.device_name)
    .bind(req.device_vendor_id)
    .bind(req.device_label_id)
    .bind(req.device_user_id)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| AppError::from_insert(e, "Device"))?;

    Ok((StatusCode::CREATED, Json(device)))
}

/// GET /api/v1/devices
async fn list_devices(
    State(state): State<AppState>,
    Query(query): Query<ListDevicesQuery>,
) -> Result<Json<Vec<DeviceWithVendor>>, AppError> {
    let devices = sqlx::query_as(
        r#"
        SELECT d.id, d.device_name, v.vendor_name, d.device_date, d.visible
        FROM devices d
        LEFT JOIN vendors v ON v.id = d.device_vendor_id
        WHERE ($1::timestamptz IS NULL OR d.device_date >= $1)
          AND ($2 OR d.visible)
        ORDER BY d.device_name, v.vendor_name
        "#,
    )
    .bind(query.since)
    .bind(query.include_hidden)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(devices))
}

/// POST /api/v1/devices/{id}/visibility
///
/// Flips the visibility of a device. Only its owner may do so.
async fn toggle_visibility(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ToggleVisibilityRequest>,
) -> Result<Json<Device>, AppError> {
    let device = fetch_device(&state.pool, id).await?;
    let visible = device.toggled_visibility(req.user_id).ok_or_else(|| {
        tracing::warn!("User {} tried to toggle device {}", req.user_id, id);
        AppError::Forbidden("Access denied, not the owner".to_string())
    })?;

    let device: Device =
        sqlx::query_as("UPDATE devices SET visible = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(visible)
            .fetch_one(&state.pool)
            .await?;

    Ok(Json(device))
}

/// GET /api/v1/devices/{id}/report
async fn device_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeviceReport>, AppError> {
    fetch_device(&state.pool, id).await?;

    let analyses: Vec<FirmwareAnalysis> = sqlx::query_as(
        r#"
        SELECT fa.*
        FROM firmware_analyses fa
        JOIN analysis_devices ad ON ad.analysis_id = fa.id
        WHERE ad.device_id = $1
        ORDER BY fa.start_date
        "#,
    )
    .bind(id)
    .fetch_all(&state.pool)
    .await?;

    let results: Vec<AnalysisResult> = sqlx::query_as(
        r#"
        SELECT ar.*
        FROM analysis_results ar
        JOIN analysis_devices ad ON ad.analysis_id = ar.firmware_analysis_id
        WHERE ad.device_id = $1
        "#,
    )
    .bind(id)
    .fetch_all(&state.pool)
    .await?;

    let report = build_device_report(id, &analyses, &results).ok_or_else(|| {
        AppError::NotFound(format!("No successful analysis for device {}", id))
    })?;

    Ok(Json(report))
}
