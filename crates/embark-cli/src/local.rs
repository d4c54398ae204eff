// Lifecycle operations run directly against the storage roots.
//
// Used by operators on the scan host when the tracker server is not
// reachable or a log directory has to be handled by hand.

use anyhow::{anyhow, Context, Result};
use clap::Args;
use embark_core::{AnalysisFiles, FlagSource, LifecycleConfig};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Storage roots, defaulting to the server's defaults.
#[derive(Args, Debug, Clone)]
pub struct Roots {
    /// Root of all emba log directories
    #[arg(long, default_value = "./data/emba_logs")]
    pub log_root: PathBuf,

    /// Root of the firmware uploads
    #[arg(long, default_value = "./data/media")]
    pub media_root: PathBuf,

    /// Root of the log archives
    #[arg(long, default_value = "./data/zip")]
    pub zip_root: PathBuf,

    /// Log entry kept by archival, replaces the default list (repeatable)
    #[arg(long = "keep", value_name = "NAME")]
    pub keep: Vec<String>,
}

impl Roots {
    pub fn config(&self) -> LifecycleConfig {
        let config = LifecycleConfig::new(&self.log_root, &self.media_root, &self.zip_root);
        if self.keep.is_empty() {
            config
        } else {
            config.with_retained_entries(self.keep.iter().cloned())
        }
    }
}

/// Reads an analysis record (JSON) for flag derivation.
///
/// Missing fields take their defaults, so a bare `{}` is a valid record.
pub fn read_flag_source(path: &Path) -> Result<FlagSource> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse analysis record '{}'", path.display()))
}

/// Builds the storage view of an analysis from its log directory.
///
/// Log directories are named after the analysis id, so `id` can be left out
/// for them. Archived analyses default to their zip in the archive root.
pub fn analysis_files(
    config: &LifecycleConfig,
    path_to_logs: &Path,
    id: Option<Uuid>,
    archived: bool,
    zip_path: Option<PathBuf>,
) -> Result<AnalysisFiles> {
    let id = match id {
        Some(id) => id,
        None => infer_id(path_to_logs)?,
    };

    let zip_path = match zip_path {
        Some(path) => Some(path),
        None if archived => Some(config.zip_path(&id)),
        None => None,
    };

    Ok(AnalysisFiles {
        id,
        path_to_logs: path_to_logs.to_path_buf(),
        archived,
        zip_path,
    })
}

fn infer_id(path_to_logs: &Path) -> Result<Uuid> {
    path_to_logs
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| Uuid::parse_str(name).ok())
        .ok_or_else(|| {
            anyhow!(
                "Cannot infer the analysis id from '{}', pass --id",
                path_to_logs.display()
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn config() -> LifecycleConfig {
        LifecycleConfig::new("/logs", "/media", "/zip")
    }

    #[test]
    fn test_id_inferred_from_directory_name() {
        let id = Uuid::new_v4();
        let files =
            analysis_files(&config(), &Path::new("/logs").join(id.to_string()), None, false, None)
                .unwrap();

        assert_eq!(files.id, id);
        assert!(files.zip_path.is_none());
    }

    #[test]
    fn test_unnamed_directory_needs_explicit_id() {
        let err = analysis_files(&config(), Path::new("/logs/latest"), None, false, None)
            .unwrap_err();
        assert!(err.to_string().contains("--id"));

        let id = Uuid::new_v4();
        let files =
            analysis_files(&config(), Path::new("/logs/latest"), Some(id), false, None).unwrap();
        assert_eq!(files.id, id);
    }

    #[test]
    fn test_archived_defaults_to_zip_in_archive_root() {
        let id = Uuid::new_v4();
        let files =
            analysis_files(&config(), &Path::new("/logs").join(id.to_string()), None, true, None)
                .unwrap();
        assert_eq!(files.zip_path, Some(PathBuf::from(format!("/zip/{}.zip", id))));

        let explicit = analysis_files(
            &config(),
            Path::new("/logs/x"),
            Some(id),
            true,
            Some(PathBuf::from("/zip/other.zip")),
        )
        .unwrap();
        assert_eq!(explicit.zip_path, Some(PathBuf::from("/zip/other.zip")));
    }

    #[test]
    fn test_keep_replaces_allow_list() {
        let roots = Roots {
            log_root: PathBuf::from("/logs"),
            media_root: PathBuf::from("/media"),
            zip_root: PathBuf::from("/zip"),
            keep: vec!["emba.log".to_string()],
        };
        let config = roots.config();
        assert!(config.is_retained("emba.log"));
        assert!(!config.is_retained("html_report"));

        let defaults = Roots {
            keep: Vec::new(),
            ..roots
        };
        assert!(defaults.config().is_retained("html_report"));
    }

    #[test]
    fn test_read_flag_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.json");
        fs::write(
            &path,
            r#"{"version": "2.0", "architecture": "MIPS", "scan_modules": ["s05"]}"#,
        )
        .unwrap();

        let source = read_flag_source(&path).unwrap();
        assert_eq!(source.version, "2.0");
        assert_eq!(
            embark_core::derive_flags(&source),
            "-X \"2.0\" -a MIPS -m s05"
        );
    }

    #[test]
    fn test_read_flag_source_rejects_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.json");
        fs::write(&path, "not json").unwrap();

        let err = read_flag_source(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }
}
