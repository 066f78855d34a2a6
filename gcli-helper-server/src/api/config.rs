//! Configuration and upstream connection handlers

use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};

use gcli_helper_types::{HelperConfig, HelperError};

use super::error_response;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ConnectRequest {
    /// Upstream base URL; defaults to the configured one.
    pub url: Option<String>,
    /// Upstream access password; defaults to the configured one.
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct ConnectResponse {
    pub connected: bool,
    pub upstream_url: String,
}

/// Connect to the upstream, persisting any credentials supplied in the
/// request body for future restarts.
pub async fn connect_upstream(
    State(state): State<AppState>,
    Json(payload): Json<ConnectRequest>,
) -> Result<Json<ConnectResponse>, (StatusCode, Json<serde_json::Value>)> {
    let mut config = state.config().await;
    if let Some(url) = payload.url {
        config.upstream_url = url;
    }
    if let Some(password) = payload.password {
        config.upstream_password = password;
    }
    let config = state.apply_config(config).await.map_err(error_response)?;

    state
        .connect_upstream()
        .await
        .map_err(|e| error_response(HelperError::from(e)))?;

    Ok(Json(ConnectResponse { connected: true, upstream_url: config.upstream_url }))
}

pub async fn get_config(State(state): State<AppState>) -> Json<HelperConfig> {
    Json(state.config().await)
}

/// Partial config update: absent fields keep their current values.
#[derive(Deserialize, Default)]
pub struct ConfigRequest {
    pub upstream_url: Option<String>,
    pub upstream_password: Option<String>,
    pub upstream_timeout_secs: Option<u64>,
    pub verify_enabled: Option<bool>,
    pub verify_interval_secs: Option<u64>,
    pub verify_error_codes: Option<Vec<u16>>,
    pub quota_ttl_secs: Option<u64>,
    pub history_limit: Option<usize>,
}

pub async fn save_config(
    State(state): State<AppState>,
    Json(payload): Json<ConfigRequest>,
) -> Result<Json<HelperConfig>, (StatusCode, Json<serde_json::Value>)> {
    let mut config = state.config().await;

    if let Some(url) = payload.upstream_url {
        config.upstream_url = url;
    }
    if let Some(password) = payload.upstream_password {
        config.upstream_password = password;
    }
    if let Some(timeout) = payload.upstream_timeout_secs {
        config.upstream_timeout_secs = timeout;
    }
    if let Some(enabled) = payload.verify_enabled {
        config.verify.enabled = enabled;
    }
    if let Some(interval) = payload.verify_interval_secs {
        config.verify.interval_secs = interval;
    }
    if let Some(codes) = payload.verify_error_codes {
        config.verify.error_codes = codes;
    }
    if let Some(ttl) = payload.quota_ttl_secs {
        config.quota_ttl_secs = ttl;
    }
    if let Some(limit) = payload.history_limit {
        config.history_limit = limit;
    }

    let applied = state.apply_config(config).await.map_err(error_response)?;
    Ok(Json(applied))
}
