//! Host resource samples taken while scans run.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{NewResourceTimestamp, ResourceTimestamp};
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 1000;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(record_sample).get(recent_samples))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<i64>,
}

fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// POST /api/v1/resources
async fn record_sample(
    State(state): State<AppState>,
    Json(req): Json<NewResourceTimestamp>,
) -> Result<(StatusCode, Json<ResourceTimestamp>), AppError> {
    req.validate().map_err(AppError::BadRequest)?;

    let sample: ResourceTimestamp = sqlx::query_as(
        r#"
        INSERT INTO resource_timestamps (id, timestamp, cpu_percentage, memory_percentage)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(req.timestamp.unwrap_or_else(Utc::now))
    .bind(req.cpu_percentage)
    .bind(req.memory_percentage)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| AppError::from_insert(e, "Resource sample"))?;

    Ok((StatusCode::CREATED, Json(sample)))
}

/// GET /api/v1/resources?limit=N
///
/// Most recent samples first.
async fn recent_samples(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<ResourceTimestamp>>, AppError> {
    let samples = sqlx::query_as(
        "SELECT * FROM resource_timestamps ORDER BY timestamp DESC LIMIT $1",
    )
    .bind(clamp_limit(query.limit))
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(samples))
}
