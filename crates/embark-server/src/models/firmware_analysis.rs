//! Firmware analysis model: one emba run over a firmware file.

use chrono::{DateTime, Utc};
use embark_core::{AnalysisFiles, AnalysisStatus, Architecture, FlagSource};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::path::PathBuf;
use uuid::Uuid;

use super::device::DeviceWithVendor;
use super::validate_length;

/// Firmware name used when the firmware file is unknown.
pub const UNKNOWN_FIRMWARE_NAME: &str = "File unknown";

/// Represents one scan run stored in the database.
///
/// `finished` and `failed` are independent; a run may carry both.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FirmwareAnalysis {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    /// Process id of the emba run.
    pub pid: Option<i64>,
    pub firmware_id: Option<Uuid>,
    pub firmware_name: String,
    pub version: String,
    pub notes: String,
    /// One of the [`Architecture`] identifiers, enforced by the schema.
    pub firmware_architecture: Option<String>,
    pub user_emulation_test: bool,
    pub system_emulation_test: bool,
    pub sbom_only_test: bool,
    pub scan_modules: Vec<String>,
    pub zip_file_id: Option<Uuid>,
    /// Log directory, always below the configured log root.
    pub path_to_logs: String,
    pub log_size: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub scan_time_secs: Option<i64>,
    /// Human readable run time (`HH:MM:SS`).
    pub duration: Option<String>,
    pub finished: bool,
    pub failed: bool,
    pub archived: bool,
    pub hidden: bool,
    pub status: Json<AnalysisStatus>,
}

/// Data submitted to start a new analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewFirmwareAnalysis {
    pub user_id: Option<Uuid>,
    pub firmware_id: Option<Uuid>,
    pub version: String,
    pub notes: String,
    pub firmware_architecture: Option<Architecture>,
    pub user_emulation_test: bool,
    pub system_emulation_test: bool,
    pub sbom_only_test: bool,
    pub scan_modules: Vec<String>,
    pub device_ids: Vec<Uuid>,
    pub label_ids: Vec<Uuid>,
}

/// End-of-run stamp written when an analysis finishes or fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub end_date: DateTime<Utc>,
    pub scan_time_secs: i64,
    pub duration: String,
}

impl Completion {
    pub fn new(start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> Self {
        let secs = (end_date - start_date).num_seconds().max(0);
        Self {
            end_date,
            scan_time_secs: secs,
            duration: format_duration(secs),
        }
    }
}

/// Formats seconds as `HH:MM:SS`; hours are not wrapped.
pub fn format_duration(secs: i64) -> String {
    let secs = secs.max(0);
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

fn is_valid_module_id(module: &str) -> bool {
    !module.is_empty() && module.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl NewFirmwareAnalysis {
    /// Rejects malformed submissions before they reach the lifecycle.
    ///
    /// Module ids end up unquoted on the emba command line, so they are
    /// restricted to `[A-Za-z0-9_]`.
    pub fn validate(&self) -> Result<(), String> {
        validate_length("version", &self.version)?;
        validate_length("notes", &self.notes)?;
        if let Some(bad) = self.scan_modules.iter().find(|m| !is_valid_module_id(m)) {
            return Err(format!("Invalid scan module: '{}'", bad));
        }
        Ok(())
    }
}

impl FirmwareAnalysis {
    pub fn architecture(&self) -> Option<Architecture> {
        self.firmware_architecture
            .as_deref()
            .and_then(|arch| arch.parse().ok())
    }

    /// True while neither completion flag is set.
    pub fn is_running(&self) -> bool {
        !self.finished && !self.failed
    }

    /// Inputs of the emba command line for this analysis and its devices.
    pub fn flag_source(&self, devices: &[DeviceWithVendor]) -> FlagSource {
        FlagSource {
            analysis_id: self.id,
            version: self.version.clone(),
            notes: self.notes.clone(),
            devices: devices.iter().map(DeviceWithVendor::tag).collect(),
            architecture: self.architecture(),
            user_emulation_test: self.user_emulation_test,
            system_emulation_test: self.system_emulation_test,
            scan_modules: self.scan_modules.clone(),
        }
    }

    /// Storage view handed to the lifecycle controller.
    pub fn files(&self, zip_path: Option<PathBuf>) -> AnalysisFiles {
        AnalysisFiles {
            id: self.id,
            path_to_logs: PathBuf::from(&self.path_to_logs),
            archived: self.archived,
            zip_path,
        }
    }
}
