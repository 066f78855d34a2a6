use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;

use super::quota::{get_quota, refresh_quota, QuotaQuery};
use crate::test_helpers::{cred, install_upstream, test_app_state};

#[tokio::test]
async fn test_quota_without_upstream_is_bad_request() {
    let (state, _tmp) = test_app_state().await;
    let err = get_quota(State(state), Query(QuotaQuery { refresh: false })).await.unwrap_err();
    assert_eq!(err.0, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_quota_second_read_served_from_cache() {
    let (state, _tmp) = test_app_state().await;
    install_upstream(&state, vec![cred("cred-1.json", false, vec![])]).await;

    let Json(first) =
        get_quota(State(state.clone()), Query(QuotaQuery { refresh: false })).await.unwrap();
    assert!(!first.cached);
    assert_eq!(first.items.len(), 1);
    assert_eq!(first.items[0].filename, "cred-1.json");

    let Json(second) =
        get_quota(State(state), Query(QuotaQuery { refresh: false })).await.unwrap();
    assert!(second.cached);
}

#[tokio::test]
async fn test_refresh_bypasses_cache() {
    let (state, _tmp) = test_app_state().await;
    install_upstream(&state, vec![cred("cred-1.json", false, vec![])]).await;

    get_quota(State(state.clone()), Query(QuotaQuery { refresh: false })).await.unwrap();
    let Json(refreshed) = refresh_quota(State(state)).await.unwrap();
    assert!(!refreshed.cached);
}
