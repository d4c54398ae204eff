//! Log archive model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::path::PathBuf;
use uuid::Uuid;

/// Zip archive of an archived analysis' pruned logs.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LogZipFile {
    pub id: Uuid,
    pub file_path: String,
    /// SHA-256 of the archive (hex-encoded).
    pub sha256: String,
    pub size_bytes: i64,
    pub upload_date: DateTime<Utc>,
    pub user_id: Option<Uuid>,
}

impl LogZipFile {
    pub fn path(&self) -> PathBuf {
        PathBuf::from(&self.file_path)
    }
}
