//! Verification scheduler handlers

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;

use gcli_helper_core::{SchedulerStatus, SweepSummary};
use gcli_helper_types::{VerificationRecord, VerifyOutcome};

use super::{error_response, not_connected};
use crate::state::AppState;

pub async fn get_verify_status(State(state): State<AppState>) -> Json<SchedulerStatus> {
    Json(state.inner.scheduler.status().await)
}

/// Run a manual sweep right now. Responds 409 when a sweep is already in
/// flight and 400 when no upstream connection exists yet.
pub async fn trigger_verify(
    State(state): State<AppState>,
) -> Result<Json<SweepSummary>, (StatusCode, Json<serde_json::Value>)> {
    let Some(upstream) = state.upstream().await else {
        return Err(not_connected());
    };

    let summary = state
        .inner
        .scheduler
        .trigger_now(upstream.as_ref())
        .await
        .map_err(error_response)?;
    Ok(Json(summary))
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub outcome: Option<VerifyOutcome>,
    pub limit: Option<usize>,
}

pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Json<Vec<VerificationRecord>> {
    Json(state.inner.history.list(query.outcome, query.limit).await)
}

/// Full history as a plain-text attachment, newest-first.
pub async fn download_history(State(state): State<AppState>) -> Response {
    let body = state.inner.history.export_text().await;
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"verification_history.txt\"",
            ),
        ],
        body,
    )
        .into_response()
}

pub async fn clear_history(State(state): State<AppState>) -> Json<bool> {
    state.inner.history.clear().await;
    state.inner.broadcaster.publish("Verification history cleared");
    Json(true)
}
