//! Embark Server - firmware analysis tracker API
//!
//! This crate persists firmware analyses, devices and vendors and drives the
//! emba flag derivation and log lifecycle from `embark-core`.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod tracker;

pub use config::ServerConfig;
pub use error::AppError;
pub use routes::create_router;
pub use state::AppState;
