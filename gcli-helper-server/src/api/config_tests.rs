use axum::extract::State;
use axum::response::Json;

use super::config::{get_config, save_config, ConfigRequest};
use super::get_status;
use super::stats::{get_model_stats, reset_model_stats};
use crate::test_helpers::{install_upstream, test_app_state};

#[tokio::test]
async fn test_get_config_defaults() {
    let (state, _tmp) = test_app_state().await;
    let Json(config) = get_config(State(state)).await;
    assert_eq!(config.upstream_url, "http://127.0.0.1:7861");
    assert_eq!(config.quota_ttl_secs, 300);
    assert!(!config.verify.enabled);
}

#[tokio::test]
async fn test_save_config_partial_update_with_clamp() {
    let (state, _tmp) = test_app_state().await;
    let request = ConfigRequest {
        verify_enabled: Some(true),
        verify_interval_secs: Some(30),
        ..Default::default()
    };

    let Json(applied) = save_config(State(state.clone()), Json(request)).await.unwrap();
    assert!(applied.verify.enabled);
    // Sub-minute intervals are floored.
    assert_eq!(applied.verify.interval_secs, 60);
    // Untouched fields keep their values.
    assert_eq!(applied.upstream_url, "http://127.0.0.1:7861");

    // The running scheduler picked the settings up.
    let status = state.inner.scheduler.status().await;
    assert!(status.enabled);
    assert_eq!(status.interval_secs, 60);
}

#[tokio::test]
async fn test_save_config_survives_restart() {
    let (state, tmp) = test_app_state().await;
    let request = ConfigRequest {
        upstream_url: Some("http://upstream:7861".to_string()),
        quota_ttl_secs: Some(600),
        ..Default::default()
    };
    save_config(State(state), Json(request)).await.unwrap();

    let reloaded = crate::state::AppState::new(tmp.path()).await.unwrap();
    let config = reloaded.config().await;
    assert_eq!(config.upstream_url, "http://upstream:7861");
    assert_eq!(config.quota_ttl_secs, 600);
}

#[tokio::test]
async fn test_status_probes_upstream_connectivity() {
    let (state, _tmp) = test_app_state().await;

    let Json(status) = get_status(State(state.clone())).await;
    assert!(!status.connected);
    assert!(!status.log_forwarder.connected);

    install_upstream(&state, vec![]).await;
    let Json(status) = get_status(State(state)).await;
    // The probe against the installed upstream answers.
    assert!(status.connected);
    assert_eq!(status.history_count, 0);
}

#[tokio::test]
async fn test_model_stats_empty_and_reset() {
    let (state, _tmp) = test_app_state().await;

    let Json(stats) = get_model_stats(State(state.clone())).await;
    assert_eq!(stats.total_calls, 0);

    state
        .inner
        .stats
        .observe_line("Model: gemini-2.0-flash | Input: 10 | Output: 5 | Total: 15")
        .await;
    let Json(stats) = get_model_stats(State(state.clone())).await;
    assert_eq!(stats.total_calls, 1);
    assert_eq!(stats.total_tokens, 15);

    let Json(reset) = reset_model_stats(State(state.clone())).await;
    assert!(reset);
    let Json(stats) = get_model_stats(State(state)).await;
    assert_eq!(stats.total_calls, 0);
}
