//! Trait seam between the core services and the upstream HTTP client.

use std::sync::Arc;

use async_trait::async_trait;

use gcli_helper_client::{LogLineStream, UpstreamClient, UpstreamError, VerifyResult};
use gcli_helper_types::{Credential, CredentialQuota};

/// Operations the scheduler and quota cache need from the upstream.
///
/// Production code uses [`UpstreamClient`]; tests substitute mocks with
/// scripted responses and controllable delays.
#[async_trait]
pub trait UpstreamApi: Send + Sync {
    /// List all credentials with status and recorded error codes.
    async fn list_credentials(&self) -> Result<Vec<Credential>, UpstreamError>;

    /// Trigger the verify/recover call for one credential.
    async fn verify(&self, filename: &str) -> Result<VerifyResult, UpstreamError>;

    /// Fetch quota snapshots for all credentials (one batched pass).
    async fn fetch_quotas(&self) -> Result<Vec<CredentialQuota>, UpstreamError>;

    /// Connectivity probe.
    async fn probe(&self) -> Result<(), UpstreamError>;

    /// Attach to the upstream's live log stream. One connection per call;
    /// the log forwarder owns the reconnect policy.
    async fn stream_logs(&self) -> Result<LogLineStream, UpstreamError>;
}

/// Slot holding the currently connected upstream, shared between API
/// handlers (which replace it on reconnect) and the scheduler ticker.
/// `None` until the first successful connect.
pub type SharedUpstream = Arc<tokio::sync::RwLock<Option<Arc<dyn UpstreamApi>>>>;

#[async_trait]
impl UpstreamApi for UpstreamClient {
    async fn list_credentials(&self) -> Result<Vec<Credential>, UpstreamError> {
        UpstreamClient::list_credentials(self).await
    }

    async fn verify(&self, filename: &str) -> Result<VerifyResult, UpstreamError> {
        UpstreamClient::verify(self, filename).await
    }

    async fn fetch_quotas(&self) -> Result<Vec<CredentialQuota>, UpstreamError> {
        UpstreamClient::fetch_quotas(self).await
    }

    async fn probe(&self) -> Result<(), UpstreamError> {
        UpstreamClient::probe(self).await
    }

    async fn stream_logs(&self) -> Result<LogLineStream, UpstreamError> {
        UpstreamClient::stream_logs(self).await
    }
}
