//! API Routes
//!
//! REST API for the helper dashboard and CLI control.

mod config;
mod quota;
mod stats;
mod stream;
mod verify;

#[cfg(test)]
mod config_tests;
#[cfg(test)]
mod quota_tests;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Serialize;

use gcli_helper_core::{LogForwarderStatus, QuotaCacheStatus, SchedulerStatus};
use gcli_helper_types::HelperError;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        // Status
        .route("/status", get(get_status))
        // Upstream connection
        .route("/connect", post(config::connect_upstream))
        // Config
        .route("/config", get(config::get_config))
        .route("/config", post(config::save_config))
        // Verification
        .route("/verify/status", get(verify::get_verify_status))
        .route("/verify/trigger", post(verify::trigger_verify))
        .route("/verify/history", get(verify::get_history))
        .route("/verify/history/download", get(verify::download_history))
        .route("/verify/history/clear", post(verify::clear_history))
        .route("/verify/logs/stream", get(stream::stream_logs))
        // Quota
        .route("/quota", get(quota::get_quota))
        .route("/quota/refresh", post(quota::refresh_quota))
        // Model usage stats
        .route("/stats", get(stats::get_model_stats))
        .route("/stats/reset", post(stats::reset_model_stats))
        // API fallback: return 404 for unknown API endpoints
        .fallback(api_not_found)
}

async fn api_not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({"error": "Not found"})))
}

/// Map a helper error to an HTTP response. Upstream 4xx rejections pass
/// their status through; 5xx and transport failures surface as 502.
pub(crate) fn error_response(err: HelperError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match &err {
        HelperError::AlreadyRunning => StatusCode::CONFLICT,
        HelperError::NotFound { .. } => StatusCode::NOT_FOUND,
        HelperError::Unreachable(_) => StatusCode::BAD_GATEWAY,
        HelperError::Rejected { status, .. } => StatusCode::from_u16(*status)
            .ok()
            .filter(StatusCode::is_client_error)
            .unwrap_or(StatusCode::BAD_GATEWAY),
        HelperError::QuotaUnsupported(_) | HelperError::Config(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({"error": err.to_string()})))
}

/// Response for handlers that need an upstream connection before one was
/// established via `/api/connect`.
pub(crate) fn not_connected() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({"error": "Not connected to upstream"})),
    )
}

#[derive(Serialize)]
pub(crate) struct StatusResponse {
    pub version: String,
    /// Live probe against the upstream, not just slot occupancy.
    pub connected: bool,
    pub scheduler: SchedulerStatus,
    pub quota_cache: QuotaCacheStatus,
    pub log_forwarder: LogForwarderStatus,
    pub history_count: usize,
    pub log_subscribers: usize,
}

pub(crate) async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let connected = match state.upstream().await {
        Some(upstream) => upstream.probe().await.is_ok(),
        None => false,
    };

    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        connected,
        scheduler: state.inner.scheduler.status().await,
        quota_cache: state.inner.quota_cache.status().await,
        log_forwarder: state.inner.forwarder.status(),
        history_count: state.inner.history.len().await,
        log_subscribers: state.inner.broadcaster.subscriber_count(),
    })
}
