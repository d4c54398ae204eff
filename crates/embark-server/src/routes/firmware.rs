//! Firmware upload registry.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use sqlx::PgPool;
use std::path::PathBuf;
use uuid::Uuid;

use super::DeleteResponse;
use crate::error::AppError;
use crate::models::{FirmwareFile, NewFirmwareFile};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(register_firmware))
        .route("/{id}", get(get_firmware).delete(delete_firmware))
        .with_state(state)
}

/// A firmware record and where its upload belongs.
#[derive(Debug, Serialize)]
pub struct FirmwareResponse {
    pub firmware: FirmwareFile,
    pub storage_path: PathBuf,
}

async fn fetch_firmware(pool: &PgPool, id: Uuid) -> Result<FirmwareFile, AppError> {
    sqlx::query_as("SELECT * FROM firmware_files WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Firmware {} not found", id)))
}

fn respond(state: &AppState, firmware: FirmwareFile) -> FirmwareResponse {
    let storage_path = firmware.storage_path(&state.lifecycle.config().media_root);
    FirmwareResponse {
        firmware,
        storage_path,
    }
}

/// POST /api/v1/firmware
///
/// Registers an upload. The file itself is placed at `storage_path` by the
/// uploader.
async fn register_firmware(
    State(state): State<AppState>,
    Json(req): Json<NewFirmwareFile>,
) -> Result<(StatusCode, Json<FirmwareResponse>), AppError> {
    req.validate().map_err(AppError::BadRequest)?;

    let firmware: FirmwareFile = sqlx::query_as(
        r#"
        INSERT INTO firmware_files (id, file_name, is_archive, user_id)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&req.file_name)
    .bind(req.is_archive)
    .bind(req.user_id)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| AppError::from_insert(e, "Firmware"))?;

    tracing::info!("Registered firmware {} ({})", firmware.id, firmware);
    Ok((StatusCode::CREATED, Json(respond(&state, firmware))))
}

/// GET /api/v1/firmware/{id}
async fn get_firmware(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FirmwareResponse>, AppError> {
    let firmware = fetch_firmware(&state.pool, id).await?;
    Ok(Json(respond(&state, firmware)))
}

/// DELETE /api/v1/firmware/{id}
///
/// Removes the upload folder, then the record. Analyses of the firmware
/// keep their logs and lose the reference.
async fn delete_firmware(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, AppError> {
    fetch_firmware(&state.pool, id).await?;

    let lifecycle = state.lifecycle.clone();
    let cleanup = tokio::task::spawn_blocking(move || lifecycle.pre_delete_firmware(id)).await?;

    sqlx::query("DELETE FROM firmware_files WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(Json(DeleteResponse { id, cleanup }))
}
