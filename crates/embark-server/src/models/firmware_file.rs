//! Firmware file model for uploaded images.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// An uploaded firmware binary or archive.
///
/// The file lives at `<media_root>/<id>/<file_name>`; the whole `<id>`
/// folder is removed when the record is deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FirmwareFile {
    pub id: Uuid,
    pub file_name: String,
    pub is_archive: bool,
    pub upload_date: DateTime<Utc>,
    pub user_id: Option<Uuid>,
}

/// Data required to register an uploaded firmware file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFirmwareFile {
    pub file_name: String,
    #[serde(default)]
    pub is_archive: bool,
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

impl NewFirmwareFile {
    /// The name must be a single path component.
    pub fn validate(&self) -> Result<(), String> {
        let name = self.file_name.as_str();
        if name.is_empty() || name == "." || name == ".." {
            return Err(format!("Invalid file name: '{}'", name));
        }
        if name.contains('/') || name.contains('\\') || name.contains('\0') {
            return Err(format!("File name must not contain path separators: '{}'", name));
        }
        // copied into firmware_analyses.firmware_name
        super::validate_length("file_name", name)
    }
}

impl FirmwareFile {
    pub fn folder_path(&self, media_root: &Path) -> PathBuf {
        media_root.join(self.id.to_string())
    }

    pub fn storage_path(&self, media_root: &Path) -> PathBuf {
        self.folder_path(media_root).join(&self.file_name)
    }
}

impl std::fmt::Display for FirmwareFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.file_name.replace('/', " - "))
    }
}
