//! Log directory pruning and zipping.

use serde::Serialize;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{LifecycleError, Result};
use crate::hash::sha256_file;

/// A single entry that could not be removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupFailure {
    pub path: PathBuf,
    pub error: String,
}

/// What a pruning pass kept, removed and failed to remove.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    pub retained: Vec<String>,
    pub removed: Vec<String>,
    pub failures: Vec<CleanupFailure>,
}

impl PruneReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A written log archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZipArtifact {
    pub path: PathBuf,
    pub size_bytes: u64,
    /// Lowercase hex SHA-256 of the archive file.
    pub sha256: String,
}

/// Removes a file, a symlink or a whole directory tree.
///
/// Symlinks are unlinked, never followed.
pub(crate) fn remove_entry(path: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Deletes every top-level entry of `dir` whose name is not in `retained`.
///
/// Removal is best effort: a failing entry is recorded and the pass moves on.
/// Only an unreadable `dir` is an error.
pub fn prune_log_dir(dir: &Path, retained: &[String]) -> Result<PruneReport> {
    prune_with(dir, retained, remove_entry)
}

fn prune_with<F>(dir: &Path, retained: &[String], remove: F) -> Result<PruneReport>
where
    F: Fn(&Path) -> io::Result<()>,
{
    if !dir.is_dir() {
        return Err(LifecycleError::MissingLogDir(dir.to_path_buf()));
    }

    let mut entries: Vec<_> = fs::read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    let mut report = PruneReport::default();
    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        if retained.iter().any(|keep| *keep == name) {
            report.retained.push(name);
            continue;
        }

        let path = entry.path();
        match remove(&path) {
            Ok(()) => {
                tracing::debug!("removed {}", path.display());
                report.removed.push(name);
            }
            Err(e) => {
                tracing::warn!("failed to remove {}: {}", path.display(), e);
                report.failures.push(CleanupFailure {
                    path,
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(report)
}

/// Writes the tree below `src` into a deflate-compressed zip at `dest`.
///
/// Entry names are relative to `src` and use `/` separators. Parent
/// directories of `dest` are created as needed.
pub fn zip_dir(src: &Path, dest: &Path) -> Result<ZipArtifact> {
    if !src.is_dir() {
        return Err(LifecycleError::MissingLogDir(src.to_path_buf()));
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = ZipWriter::new(File::create(dest)?);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(src).follow_links(false).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if path == dest {
            continue;
        }
        let rel = match path.strip_prefix(src) {
            Ok(rel) if !rel.as_os_str().is_empty() => rel,
            _ => continue,
        };
        let name = rel.to_string_lossy().replace('\\', "/");

        if entry.file_type().is_dir() {
            writer.add_directory(name, options)?;
        } else if entry.file_type().is_file() {
            writer.start_file(name, options)?;
            let mut file = File::open(path)?;
            io::copy(&mut file, &mut writer)?;
        }
    }
    writer.finish()?;

    let (sha256, size_bytes) = sha256_file(dest)?;
    Ok(ZipArtifact {
        path: dest.to_path_buf(),
        size_bytes,
        sha256,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RETAINED_LOG_ENTRIES;

    fn allow_list() -> Vec<String> {
        RETAINED_LOG_ENTRIES.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_prune_removes_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("html_report")).unwrap();
        fs::create_dir_all(dir.path().join("firmware/extracted")).unwrap();
        fs::write(dir.path().join("emba.log"), b"log").unwrap();
        fs::write(dir.path().join("tmp.txt"), b"x").unwrap();

        let report = prune_log_dir(dir.path(), &allow_list()).unwrap();

        assert_eq!(report.retained, vec!["emba.log", "html_report"]);
        assert_eq!(report.removed, vec!["firmware", "tmp.txt"]);
        assert!(report.is_clean());
        assert!(!dir.path().join("firmware").exists());
        assert!(!dir.path().join("tmp.txt").exists());
    }

    #[test]
    fn test_prune_continues_past_failing_entry() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a_tmp"), b"x").unwrap();
        fs::write(dir.path().join("b_locked"), b"x").unwrap();
        fs::create_dir_all(dir.path().join("c_tmp/deep")).unwrap();
        fs::write(dir.path().join("emba.log"), b"log").unwrap();

        let report = prune_with(dir.path(), &allow_list(), |path| {
            if path.ends_with("b_locked") {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "busy"))
            } else {
                remove_entry(path)
            }
        })
        .unwrap();

        assert!(!report.is_clean());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, dir.path().join("b_locked"));
        assert!(report.failures[0].error.contains("busy"));
        assert_eq!(report.removed, vec!["a_tmp", "c_tmp"]);
        assert_eq!(report.retained, vec!["emba.log"]);

        assert!(dir.path().join("b_locked").exists());
        assert!(!dir.path().join("a_tmp").exists());
        assert!(!dir.path().join("c_tmp").exists());
    }

    #[test]
    fn test_prune_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = prune_log_dir(&dir.path().join("gone"), &allow_list()).unwrap_err();
        assert!(matches!(err, LifecycleError::MissingLogDir(_)));
    }

    #[test]
    fn test_zip_dir_contains_relative_entries() {
        let src = tempfile::tempdir().unwrap();
        fs::create_dir_all(src.path().join("html_report/style")).unwrap();
        fs::write(src.path().join("html_report/index.html"), b"<html/>").unwrap();
        fs::write(src.path().join("emba.log"), b"done").unwrap();

        let out = tempfile::tempdir().unwrap();
        let dest = out.path().join("nested/archive.zip");
        let artifact = zip_dir(src.path(), &dest).unwrap();

        assert_eq!(artifact.path, dest);
        assert_eq!(artifact.sha256.len(), 64);
        assert_eq!(artifact.size_bytes, fs::metadata(&dest).unwrap().len());

        let mut archive = zip::ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        let mut names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "emba.log",
                "html_report/",
                "html_report/index.html",
                "html_report/style/",
            ]
        );
    }
}
