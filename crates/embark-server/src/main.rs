//! Firmware analysis tracker API server

use anyhow::Context;
use embark_core::AnalysisLifecycle;
use embark_server::db::{create_pool, run_migrations};
use embark_server::{create_router, AppState, ServerConfig};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "embark_server=debug,embark_core=info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting embark tracker server");

    let config = ServerConfig::from_env();
    for root in [&config.log_root, &config.media_root, &config.zip_root] {
        std::fs::create_dir_all(root)
            .with_context(|| format!("Failed to create {}", root.display()))?;
    }

    let pool = create_pool(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");

    run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;
    info!("Migrations complete");

    let state = AppState::new(pool, AnalysisLifecycle::new(config.lifecycle_config()));
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
