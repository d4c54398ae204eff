//! Device tracker overview.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;
use crate::tracker::{default_since, VendorDeviceCount};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(vendor_counts))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct TrackerQuery {
    pub since: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct TrackerResponse {
    pub since: DateTime<Utc>,
    pub vendors: Vec<VendorDeviceCount>,
}

/// GET /api/v1/tracker
///
/// Devices added per vendor since `since`, by default the last week.
/// Vendors without new devices are listed with a zero count.
async fn vendor_counts(
    State(state): State<AppState>,
    Query(query): Query<TrackerQuery>,
) -> Result<Json<TrackerResponse>, AppError> {
    let since = query.since.unwrap_or_else(|| default_since(Utc::now()));

    let vendors = sqlx::query_as(
        r#"
        SELECT v.vendor_name, COUNT(d.id) AS device_count
        FROM vendors v
        LEFT JOIN devices d ON d.device_vendor_id = v.id AND d.device_date >= $1
        GROUP BY v.vendor_name
        ORDER BY v.vendor_name
        "#,
    )
    .bind(since)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(TrackerResponse { since, vendors }))
}
