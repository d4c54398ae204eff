//! Configuration of the analysis lifecycle.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Sub-directory of an analysis log path that emba writes into.
pub const EMBA_LOGS_DIR: &str = "emba_logs";

/// Top-level log entries kept when an analysis is archived.
pub const RETAINED_LOG_ENTRIES: [&str; 8] = [
    "html_report",
    "SBOM",
    "csv_logs",
    "emba_error.log",
    "emba.log",
    "firmware_entropy.png",
    "json_logs",
    "pixd.png",
];

/// Filesystem roots and archival allow-list used by [`crate::AnalysisLifecycle`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Root that every analysis log directory must live under.
    pub log_root: PathBuf,
    /// Root of the firmware upload storage, one folder per firmware id.
    pub media_root: PathBuf,
    /// Root the log archives are written to.
    pub zip_root: PathBuf,
    /// Entry names that survive archival.
    pub retained_entries: Vec<String>,
}

impl LifecycleConfig {
    pub fn new(
        log_root: impl Into<PathBuf>,
        media_root: impl Into<PathBuf>,
        zip_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            log_root: log_root.into(),
            media_root: media_root.into(),
            zip_root: zip_root.into(),
            retained_entries: RETAINED_LOG_ENTRIES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replaces the default allow-list.
    pub fn with_retained_entries<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.retained_entries = entries.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_retained(&self, name: &str) -> bool {
        self.retained_entries.iter().any(|entry| entry == name)
    }

    /// Upload folder of a firmware file.
    pub fn firmware_folder(&self, firmware_id: &uuid::Uuid) -> PathBuf {
        self.media_root.join(firmware_id.to_string())
    }

    /// Default log directory for a new analysis.
    pub fn analysis_log_path(&self, analysis_id: &uuid::Uuid) -> PathBuf {
        self.log_root.join(analysis_id.to_string())
    }

    /// Location of the log archive of an analysis.
    pub fn zip_path(&self, analysis_id: &uuid::Uuid) -> PathBuf {
        self.zip_root.join(format!("{}.zip", analysis_id))
    }
}
