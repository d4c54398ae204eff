//! Server configuration read from the environment.

use embark_core::LifecycleConfig;
use std::path::PathBuf;

/// Runtime configuration of the tracker server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub database_url: String,
    pub bind_addr: String,
    /// Root of all emba log directories (`EMBA_LOG_ROOT`).
    pub log_root: PathBuf,
    /// Root of the firmware upload storage (`MEDIA_ROOT`).
    pub media_root: PathBuf,
    /// Root of the log archives (`ZIP_ROOT`).
    pub zip_root: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        Self {
            database_url: var("DATABASE_URL", "postgres://localhost/embark"),
            bind_addr: var("BIND_ADDR", "0.0.0.0:8001"),
            log_root: PathBuf::from(var("EMBA_LOG_ROOT", "./data/emba_logs")),
            media_root: PathBuf::from(var("MEDIA_ROOT", "./data/media")),
            zip_root: PathBuf::from(var("ZIP_ROOT", "./data/zip")),
        }
    }

    pub fn lifecycle_config(&self) -> LifecycleConfig {
        LifecycleConfig::new(&self.log_root, &self.media_root, &self.zip_root)
    }
}
