//! Archival and pre-delete handling of analysis and firmware storage.
//!
//! The controller never propagates filesystem failures out of the delete
//! paths; callers receive a [`DeletionOutcome`] and proceed with removing
//! the record either way.

use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::archive::{prune_log_dir, remove_entry, zip_dir, PruneReport, ZipArtifact};
use crate::config::{LifecycleConfig, EMBA_LOGS_DIR};
use crate::error::{LifecycleError, Result};
use crate::paths::is_confined;

/// Storage-relevant fields of an analysis record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisFiles {
    pub id: Uuid,
    pub path_to_logs: PathBuf,
    pub archived: bool,
    /// Archive file recorded for the analysis, if any.
    pub zip_path: Option<PathBuf>,
}

impl AnalysisFiles {
    /// Directory emba writes its logs into.
    pub fn emba_logs_dir(&self) -> PathBuf {
        self.path_to_logs.join(EMBA_LOGS_DIR)
    }
}

/// Result of a pre-delete cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeletionOutcome {
    Removed { path: PathBuf },
    Skipped { path: Option<PathBuf>, reason: String },
    Failed { path: PathBuf, error: String },
}

impl DeletionOutcome {
    pub fn is_removed(&self) -> bool {
        matches!(self, DeletionOutcome::Removed { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, DeletionOutcome::Failed { .. })
    }

    fn skipped(path: Option<&Path>, reason: impl Into<String>) -> Self {
        DeletionOutcome::Skipped {
            path: path.map(Path::to_path_buf),
            reason: reason.into(),
        }
    }
}

/// Result of archiving an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveReport {
    pub pruned: PruneReport,
    pub zip: Option<ZipArtifact>,
}

/// Lifecycle controller for analysis logs and firmware uploads.
#[derive(Debug, Clone)]
pub struct AnalysisLifecycle {
    config: LifecycleConfig,
}

impl AnalysisLifecycle {
    pub fn new(config: LifecycleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Prunes the emba log directory down to the allow-list, then optionally
    /// zips what is left into the archive root.
    ///
    /// Refuses to touch anything outside the log root. Running it again on an
    /// archived directory removes nothing.
    pub fn archive(&self, files: &AnalysisFiles, zip: bool) -> Result<ArchiveReport> {
        let log_dir = files.emba_logs_dir();
        if !is_confined(&self.config.log_root, &log_dir) {
            return Err(LifecycleError::Unconfined {
                path: log_dir,
                root: self.config.log_root.clone(),
            });
        }

        tracing::info!("Archiving {}", files.id);
        let pruned = prune_log_dir(&log_dir, &self.config.retained_entries)?;
        tracing::debug!(
            "pruned {}: kept {}, removed {}, failed {}",
            files.id,
            pruned.retained.len(),
            pruned.removed.len(),
            pruned.failures.len()
        );

        let zip = if zip {
            let artifact = zip_dir(&log_dir, &self.config.zip_path(&files.id))?;
            tracing::info!(
                "Archived {} to {} ({} bytes)",
                files.id,
                artifact.path.display(),
                artifact.size_bytes
            );
            Some(artifact)
        } else {
            None
        };

        Ok(ArchiveReport { pruned, zip })
    }

    /// Cleans up the storage of an analysis that is about to be deleted.
    ///
    /// Unarchived analyses lose their whole log directory, provided it is
    /// confined to the log root. Archived analyses keep their log directory
    /// and lose the zip archive instead.
    pub fn pre_delete_analysis(&self, files: &AnalysisFiles) -> DeletionOutcome {
        let outcome = if files.archived {
            match files.zip_path.as_deref() {
                Some(zip_path) => remove_confined(&self.config.zip_root, zip_path),
                None => DeletionOutcome::skipped(None, "archived analysis has no zip archive"),
            }
        } else {
            remove_confined(&self.config.log_root, &files.path_to_logs)
        };
        report(&format!("analysis {}", files.id), &outcome);
        outcome
    }

    /// Cleans up the upload folder of a firmware file that is about to be deleted.
    pub fn pre_delete_firmware(&self, firmware_id: Uuid) -> DeletionOutcome {
        let folder = self.config.firmware_folder(&firmware_id);
        let outcome = remove_confined(&self.config.media_root, &folder);
        report(&format!("firmware {}", firmware_id), &outcome);
        outcome
    }
}

fn remove_confined(root: &Path, path: &Path) -> DeletionOutcome {
    if !is_confined(root, path) {
        return DeletionOutcome::skipped(
            Some(path),
            format!("path is not confined to {}", root.display()),
        );
    }

    match remove_entry(path) {
        Ok(()) => DeletionOutcome::Removed {
            path: path.to_path_buf(),
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            DeletionOutcome::skipped(Some(path), "already absent")
        }
        Err(e) => DeletionOutcome::Failed {
            path: path.to_path_buf(),
            error: e.to_string(),
        },
    }
}

fn report(subject: &str, outcome: &DeletionOutcome) {
    match outcome {
        DeletionOutcome::Removed { path } => {
            tracing::info!("Deleted storage of {}: {}", subject, path.display())
        }
        DeletionOutcome::Skipped { path, reason } => tracing::warn!(
            "Kept storage of {} ({}): {}",
            subject,
            path.as_deref().map(|p| p.display().to_string()).unwrap_or_default(),
            reason
        ),
        DeletionOutcome::Failed { path, error } => tracing::error!(
            "Error during delete of {}: {} - {}",
            subject,
            path.display(),
            error
        ),
    }
}
