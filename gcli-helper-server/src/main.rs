//! gcli-helper Server - Headless Daemon
//!
//! A pure Rust HTTP companion for a gcli2api credential proxy that:
//! - Runs scheduled verification sweeps over error-state credentials
//! - Serves cached per-credential quota snapshots
//! - Provides a REST API and a live log stream on /api/*
//!
//! Access via: http://localhost:7862

use anyhow::Result;
use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use std::net::SocketAddr;
use std::path::PathBuf;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod state;

#[cfg(test)]
mod test_helpers;

use state::AppState;

const DEFAULT_PORT: u16 = 7862;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port: u16 = std::env::var("GCLI_HELPER_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let data_dir = std::env::var("GCLI_HELPER_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./data"));

    info!("🚀 gcli-helper starting on port {}...", port);

    let state = AppState::new(&data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize application state: {}", e))?;

    // Reconnect automatically when credentials were persisted earlier.
    if !state.config().await.upstream_password.is_empty() {
        match state.connect_upstream().await {
            Ok(()) => info!("✅ Reconnected to upstream from stored config"),
            Err(e) => tracing::warn!("⚠️ Could not reconnect to upstream: {}", e),
        }
    }

    state.spawn_background_tasks();
    info!("✅ Application state initialized");

    let app = build_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("🌐 Server listening on http://{}", addr);
    info!("🔌 API available at http://localhost:{}/api/", port);

    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api::router())
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({"status": "ok"})),
    )
}
