//! Error types for the analysis lifecycle.

use std::path::PathBuf;

/// Errors raised by archival and lifecycle operations.
///
/// Deletion never surfaces these; it reports a [`crate::DeletionOutcome`] instead.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Path {} is not confined to {}", .path.display(), .root.display())]
    Unconfined { path: PathBuf, root: PathBuf },

    #[error("Log directory not found: {}", .0.display())]
    MissingLogDir(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

pub type Result<T> = std::result::Result<T, LifecycleError>;
