//! Model usage stats handlers

use axum::{extract::State, response::Json};

use gcli_helper_types::ModelUsageStats;

use crate::state::AppState;

pub async fn get_model_stats(State(state): State<AppState>) -> Json<ModelUsageStats> {
    Json(state.inner.stats.snapshot().await)
}

pub async fn reset_model_stats(State(state): State<AppState>) -> Json<bool> {
    state.inner.stats.reset().await;
    Json(true)
}
