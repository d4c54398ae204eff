// Embark Core - flag derivation and log lifecycle for emba firmware analyses

pub mod archive;
pub mod config;
pub mod error;
pub mod flags;
pub mod hash;
pub mod lifecycle;
pub mod paths;
pub mod sanitize;
pub mod types;

pub use archive::{prune_log_dir, zip_dir, CleanupFailure, PruneReport, ZipArtifact};
pub use config::{LifecycleConfig, EMBA_LOGS_DIR, RETAINED_LOG_ENTRIES};
pub use error::{LifecycleError, Result};
pub use flags::{derive_flags, CWE_CHECKER_MODULE};
pub use hash::sha256_file;
pub use lifecycle::{AnalysisFiles, AnalysisLifecycle, ArchiveReport, DeletionOutcome};
pub use paths::is_confined;
pub use sanitize::{list_repr, Sanitizer};
pub use types::{AnalysisStatus, Architecture, DeviceTag, FlagSource};
