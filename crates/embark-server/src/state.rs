//! Shared handler state.

use embark_core::AnalysisLifecycle;
use sqlx::PgPool;
use std::sync::Arc;

/// State shared by all routers.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub lifecycle: Arc<AnalysisLifecycle>,
}

impl AppState {
    pub fn new(pool: PgPool, lifecycle: AnalysisLifecycle) -> Self {
        Self {
            pool,
            lifecycle: Arc::new(lifecycle),
        }
    }
}
