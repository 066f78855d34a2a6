//! Quota snapshot handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

use gcli_helper_core::QuotaSnapshot;

use super::{error_response, not_connected};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct QuotaQuery {
    /// Bypass the cache and fetch fresh data.
    #[serde(default)]
    pub refresh: bool,
}

pub async fn get_quota(
    State(state): State<AppState>,
    Query(query): Query<QuotaQuery>,
) -> Result<Json<QuotaSnapshot>, (StatusCode, Json<serde_json::Value>)> {
    fetch(&state, query.refresh).await
}

pub async fn refresh_quota(
    State(state): State<AppState>,
) -> Result<Json<QuotaSnapshot>, (StatusCode, Json<serde_json::Value>)> {
    fetch(&state, true).await
}

async fn fetch(
    state: &AppState,
    force_refresh: bool,
) -> Result<Json<QuotaSnapshot>, (StatusCode, Json<serde_json::Value>)> {
    let Some(upstream) = state.upstream().await else {
        return Err(not_connected());
    };

    let thresholds = state.config().await.quota_thresholds;
    let snapshot = state
        .inner
        .quota_cache
        .get(upstream.as_ref(), force_refresh, &thresholds)
        .await
        .map_err(error_response)?;
    Ok(Json(snapshot))
}
