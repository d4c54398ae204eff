//! Firmware analysis endpoints: submission, progress, archival and deletion.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use embark_core::{derive_flags, AnalysisStatus, PruneReport};
use serde::{Deserialize, Serialize};
use sqlx::types::Json as DbJson;
use sqlx::PgPool;
use uuid::Uuid;

use super::DeleteResponse;
use crate::error::AppError;
use crate::models::firmware_analysis::UNKNOWN_FIRMWARE_NAME;
use crate::models::{
    AnalysisResult, Completion, DeviceWithVendor, FirmwareAnalysis, LogZipFile, NewAnalysisResult,
    NewFirmwareAnalysis,
};
use crate::state::AppState;

/// Creates the analyses router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(create_analysis).get(list_analyses))
        .route("/{id}", get(get_analysis).delete(delete_analysis))
        .route("/{id}/flags", get(get_flags))
        .route("/{id}/status", put(update_status))
        .route("/{id}/complete", post(complete_analysis))
        .route("/{id}/archive", post(archive_analysis))
        .route("/{id}/devices", post(associate_device))
        .route("/{id}/results", post(record_result))
        .with_state(state)
}

/// An analysis together with its devices and derived emba flags.
#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub analysis: FirmwareAnalysis,
    pub devices: Vec<DeviceWithVendor>,
    pub flags: String,
}

#[derive(Debug, Serialize)]
pub struct FlagsResponse {
    pub analysis_id: Uuid,
    pub flags: String,
}

/// Progress written by the running scan.
#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: AnalysisStatus,
    #[serde(default)]
    pub pid: Option<i64>,
}

fn default_true() -> bool {
    true
}

/// Completion callback of a scan.
#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    #[serde(default = "default_true")]
    pub finished: bool,
    #[serde(default)]
    pub failed: bool,
    #[serde(default)]
    pub log_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ArchiveRequest {
    #[serde(default = "default_true")]
    pub zip: bool,
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ArchiveResponse {
    pub analysis: FirmwareAnalysis,
    pub pruned: PruneReport,
    pub zip_file: Option<LogZipFile>,
}

#[derive(Debug, Deserialize)]
pub struct AssociateDeviceRequest {
    pub device_id: Uuid,
}

/// Loads an analysis or rejects the request.
pub(crate) async fn fetch_analysis(pool: &PgPool, id: Uuid) -> Result<FirmwareAnalysis, AppError> {
    sqlx::query_as("SELECT * FROM firmware_analyses WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Analysis {} not found", id)))
}

/// Devices linked to an analysis, with vendor names.
pub(crate) async fn fetch_analysis_devices(
    pool: &PgPool,
    analysis_id: Uuid,
) -> Result<Vec<DeviceWithVendor>, AppError> {
    let devices = sqlx::query_as(
        r#"
        SELECT d.id, d.device_name, v.vendor_name, d.device_date, d.visible
        FROM analysis_devices ad
        JOIN devices d ON d.id = ad.device_id
        LEFT JOIN vendors v ON v.id = d.device_vendor_id
        WHERE ad.analysis_id = $1
        ORDER BY d.device_name, v.vendor_name
        "#,
    )
    .bind(analysis_id)
    .fetch_all(pool)
    .await?;

    Ok(devices)
}

async fn fetch_zip_file(pool: &PgPool, id: Uuid) -> Result<Option<LogZipFile>, AppError> {
    let zip = sqlx::query_as("SELECT * FROM log_zip_files WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(zip)
}

async fn respond_with(pool: &PgPool, analysis: FirmwareAnalysis) -> Result<AnalysisResponse, AppError> {
    let devices = fetch_analysis_devices(pool, analysis.id).await?;
    let flags = derive_flags(&analysis.flag_source(&devices));
    Ok(AnalysisResponse {
        analysis,
        devices,
        flags,
    })
}

/// POST /api/v1/analyses
///
/// Registers a scan request. The log directory is assigned below the
/// configured log root.
async fn create_analysis(
    State(state): State<AppState>,
    Json(req): Json<NewFirmwareAnalysis>,
) -> Result<(StatusCode, Json<AnalysisResponse>), AppError> {
    req.validate().map_err(AppError::BadRequest)?;

    let firmware_name = match req.firmware_id {
        Some(firmware_id) => {
            let name: Option<(String,)> =
                sqlx::query_as("SELECT file_name FROM firmware_files WHERE id = $1")
                    .bind(firmware_id)
                    .fetch_optional(&state.pool)
                    .await?;
            name.map(|(name,)| name)
                .ok_or_else(|| AppError::NotFound(format!("Firmware {} not found", firmware_id)))?
        }
        None => UNKNOWN_FIRMWARE_NAME.to_string(),
    };

    let id = Uuid::new_v4();
    let path_to_logs = state.lifecycle.config().analysis_log_path(&id);
    let status = AnalysisStatus::for_submission(id, &firmware_name);

    let mut tx = state.pool.begin().await?;

    let analysis: FirmwareAnalysis = sqlx::query_as(
        r#"
        INSERT INTO firmware_analyses (
            id, user_id, firmware_id, firmware_name, version, notes, firmware_architecture,
            user_emulation_test, system_emulation_test, sbom_only_test, scan_modules,
            path_to_logs, start_date, status
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(req.user_id)
    .bind(req.firmware_id)
    .bind(&firmware_name)
    .bind(&req.version)
    .bind(&req.notes)
    .bind(req.firmware_architecture.map(|arch| arch.as_str()))
    .bind(req.user_emulation_test)
    .bind(req.system_emulation_test)
    .bind(req.sbom_only_test)
    .bind(&req.scan_modules)
    .bind(path_to_logs.to_string_lossy().into_owned())
    .bind(Utc::now())
    .bind(DbJson(status))
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| AppError::from_insert(e, "Analysis"))?;

    for device_id in &req.device_ids {
        sqlx::query(
            "INSERT INTO analysis_devices (analysis_id, device_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(device_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::from_insert(e, "Device link"))?;
    }

    for label_id in &req.label_ids {
        sqlx::query(
            "INSERT INTO analysis_labels (analysis_id, label_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(label_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::from_insert(e, "Label link"))?;
    }

    tx.commit().await?;

    tracing::info!("Created analysis {} for {}", id, firmware_name);
    let response = respond_with(&state.pool, analysis).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/analyses
///
/// Lists visible analyses, newest first.
async fn list_analyses(State(state): State<AppState>) -> Result<Json<Vec<FirmwareAnalysis>>, AppError> {
    let analyses = sqlx::query_as(
        "SELECT * FROM firmware_analyses WHERE hidden = FALSE ORDER BY start_date DESC",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(analyses))
}

/// GET /api/v1/analyses/{id}
async fn get_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let analysis = fetch_analysis(&state.pool, id).await?;
    Ok(Json(respond_with(&state.pool, analysis).await?))
}

/// GET /api/v1/analyses/{id}/flags
///
/// Returns the emba parameters derived from the stored record.
async fn get_flags(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FlagsResponse>, AppError> {
    let analysis = fetch_analysis(&state.pool, id).await?;
    let devices = fetch_analysis_devices(&state.pool, id).await?;

    Ok(Json(FlagsResponse {
        analysis_id: id,
        flags: derive_flags(&analysis.flag_source(&devices)),
    }))
}

/// PUT /api/v1/analyses/{id}/status
async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<Json<FirmwareAnalysis>, AppError> {
    if !(0.0..=100.0).contains(&req.status.percentage) {
        return Err(AppError::BadRequest(format!(
            "percentage out of range: {}",
            req.status.percentage
        )));
    }

    let analysis: FirmwareAnalysis = sqlx::query_as(
        r#"
        UPDATE firmware_analyses
        SET status = $2, pid = COALESCE($3, pid)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(DbJson(&req.status))
    .bind(req.pid)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Analysis {} not found", id)))?;

    Ok(Json(analysis))
}

/// POST /api/v1/analyses/{id}/complete
///
/// Sets the completion flags and stamps end date and run time.
async fn complete_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CompleteRequest>,
) -> Result<Json<FirmwareAnalysis>, AppError> {
    if req.log_size.is_some_and(|size| size < 0) {
        return Err(AppError::BadRequest("log_size must not be negative".to_string()));
    }

    let analysis = fetch_analysis(&state.pool, id).await?;
    let completion = Completion::new(analysis.start_date, Utc::now());

    let mut status = analysis.status.0.clone();
    status.finished = req.finished;
    status.work = false;

    let analysis: FirmwareAnalysis = sqlx::query_as(
        r#"
        UPDATE firmware_analyses
        SET finished = $2, failed = $3, end_date = $4, scan_time_secs = $5, duration = $6,
            log_size = COALESCE($7, log_size), status = $8
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(req.finished)
    .bind(req.failed)
    .bind(completion.end_date)
    .bind(completion.scan_time_secs)
    .bind(&completion.duration)
    .bind(req.log_size)
    .bind(DbJson(status))
    .fetch_one(&state.pool)
    .await?;

    tracing::info!(
        "Analysis {} completed (finished={}, failed={}) after {}",
        id,
        analysis.finished,
        analysis.failed,
        completion.duration
    );
    Ok(Json(analysis))
}

/// POST /api/v1/analyses/{id}/archive
///
/// Prunes the log directory and, unless disabled, zips it for long-term
/// storage. The analysis is marked archived afterwards.
async fn archive_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ArchiveRequest>,
) -> Result<Json<ArchiveResponse>, AppError> {
    let analysis = fetch_analysis(&state.pool, id).await?;
    if analysis.is_running() {
        return Err(AppError::BadRequest(format!(
            "Analysis {} is still running",
            id
        )));
    }

    let files = analysis.files(None);
    let lifecycle = state.lifecycle.clone();
    let zip = req.zip;
    let report = tokio::task::spawn_blocking(move || lifecycle.archive(&files, zip)).await??;

    let mut tx = state.pool.begin().await?;

    let zip_file: Option<LogZipFile> = match &report.zip {
        Some(artifact) => {
            let size_bytes = i64::try_from(artifact.size_bytes)
                .map_err(|_| AppError::Internal("Archive size exceeds i64".to_string()))?;
            let row = sqlx::query_as(
                r#"
                INSERT INTO log_zip_files (id, file_path, sha256, size_bytes, upload_date, user_id)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(artifact.path.to_string_lossy().into_owned())
            .bind(&artifact.sha256)
            .bind(size_bytes)
            .bind(Utc::now())
            .bind(req.user_id)
            .fetch_one(&mut *tx)
            .await?;
            Some(row)
        }
        None => None,
    };

    let updated: FirmwareAnalysis = sqlx::query_as(
        r#"
        UPDATE firmware_analyses
        SET archived = TRUE, zip_file_id = COALESCE($2, zip_file_id)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(zip_file.as_ref().map(|z| z.id))
    .fetch_one(&mut *tx)
    .await?;

    // a re-archive replaces the previous archive row, the file was overwritten
    if let (Some(previous), Some(_)) = (analysis.zip_file_id, &zip_file) {
        sqlx::query("DELETE FROM log_zip_files WHERE id = $1")
            .bind(previous)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(Json(ArchiveResponse {
        analysis: updated,
        pruned: report.pruned,
        zip_file,
    }))
}

/// POST /api/v1/analyses/{id}/devices
///
/// Links a device to an analysis. Linking twice is a no-op.
async fn associate_device(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AssociateDeviceRequest>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let analysis = fetch_analysis(&state.pool, id).await?;

    let device: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM devices WHERE id = $1")
        .bind(req.device_id)
        .fetch_optional(&state.pool)
        .await?;
    if device.is_none() {
        return Err(AppError::NotFound(format!("Device {} not found", req.device_id)));
    }

    sqlx::query(
        "INSERT INTO analysis_devices (analysis_id, device_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(id)
    .bind(req.device_id)
    .execute(&state.pool)
    .await?;

    Ok(Json(respond_with(&state.pool, analysis).await?))
}

/// POST /api/v1/analyses/{id}/results
///
/// Stores the result counters of a parsed analysis.
async fn record_result(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<NewAnalysisResult>,
) -> Result<(StatusCode, Json<AnalysisResult>), AppError> {
    req.validate().map_err(AppError::BadRequest)?;
    fetch_analysis(&state.pool, id).await?;

    let result: AnalysisResult = sqlx::query_as(
        r#"
        INSERT INTO analysis_results
            (id, firmware_analysis_id, strcpy, cve_high, cve_medium, cve_low, exploits)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(id)
    .bind(req.strcpy)
    .bind(req.cve_high)
    .bind(req.cve_medium)
    .bind(req.cve_low)
    .bind(req.exploits)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| AppError::from_insert(e, "Result"))?;

    Ok((StatusCode::CREATED, Json(result)))
}

/// DELETE /api/v1/analyses/{id}
///
/// Runs the storage cleanup first, then removes the record regardless of
/// how the cleanup went. The cleanup outcome is returned to the caller.
async fn delete_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, AppError> {
    let analysis = fetch_analysis(&state.pool, id).await?;
    let zip_file = match analysis.zip_file_id {
        Some(zip_id) => fetch_zip_file(&state.pool, zip_id).await?,
        None => None,
    };

    let files = analysis.files(zip_file.as_ref().map(LogZipFile::path));
    let lifecycle = state.lifecycle.clone();
    let cleanup = tokio::task::spawn_blocking(move || lifecycle.pre_delete_analysis(&files)).await?;

    let mut tx = state.pool.begin().await?;
    sqlx::query("DELETE FROM firmware_analyses WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if analysis.archived {
        if let Some(zip_file) = &zip_file {
            sqlx::query("DELETE FROM log_zip_files WHERE id = $1")
                .bind(zip_file.id)
                .execute(&mut *tx)
                .await?;
        }
    }
    tx.commit().await?;

    Ok(Json(DeleteResponse { id, cleanup }))
}
