//! Test helpers for gcli-helper-server unit tests.

use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use gcli_helper_client::{LogLineStream, UpstreamError, VerifyResult};
use gcli_helper_core::UpstreamApi;
use gcli_helper_types::{Credential, CredentialQuota, ModelQuota, QuotaState};

use crate::state::AppState;

/// Create a minimal `AppState` for testing.
///
/// Returns `(AppState, TempDir)` — keep `TempDir` alive for the test duration.
pub async fn test_app_state() -> (AppState, TempDir) {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let state = AppState::new(temp_dir.path())
        .await
        .expect("failed to create test AppState");
    (state, temp_dir)
}

/// Scripted upstream with a fixed credential set and log stream.
pub struct ScriptedUpstream {
    pub credentials: Vec<Credential>,
    pub log_lines: Vec<String>,
}

#[async_trait]
impl UpstreamApi for ScriptedUpstream {
    async fn list_credentials(&self) -> Result<Vec<Credential>, UpstreamError> {
        Ok(self.credentials.clone())
    }

    async fn verify(&self, _filename: &str) -> Result<VerifyResult, UpstreamError> {
        Ok(VerifyResult { success: true, message: Some("credential re-enabled".to_string()) })
    }

    async fn fetch_quotas(&self) -> Result<Vec<CredentialQuota>, UpstreamError> {
        Ok(self
            .credentials
            .iter()
            .map(|c| CredentialQuota {
                filename: c.filename.clone(),
                user_email: c.user_email.clone(),
                disabled: c.disabled,
                quota: QuotaState::Available(vec![ModelQuota {
                    model: "gemini-2.0-flash".to_string(),
                    used: 10,
                    limit: 100,
                }]),
            })
            .collect())
    }

    async fn probe(&self) -> Result<(), UpstreamError> {
        Ok(())
    }

    async fn stream_logs(&self) -> Result<LogLineStream, UpstreamError> {
        let items: Vec<Result<String, UpstreamError>> =
            self.log_lines.iter().cloned().map(Ok).collect();
        Ok(Box::pin(tokio_stream::iter(items)))
    }
}

/// Install a scripted upstream into the state's connection slot.
pub async fn install_upstream(state: &AppState, credentials: Vec<Credential>) {
    install_upstream_with_logs(state, credentials, Vec::new()).await;
}

/// Install a scripted upstream that also serves the given log lines.
pub async fn install_upstream_with_logs(
    state: &AppState,
    credentials: Vec<Credential>,
    log_lines: Vec<String>,
) {
    let upstream: Arc<dyn UpstreamApi> = Arc::new(ScriptedUpstream { credentials, log_lines });
    *state.inner.upstream.write().await = Some(upstream);
}

pub fn cred(filename: &str, disabled: bool, error_codes: Vec<u16>) -> Credential {
    Credential {
        filename: filename.to_string(),
        user_email: "user@example.com".to_string(),
        disabled,
        error_codes,
    }
}
