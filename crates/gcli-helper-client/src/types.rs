//! Wire types for the upstream HTTP API.

use std::pin::Pin;

use futures::Stream;
use gcli_helper_types::ModelQuota;
use serde::{Deserialize, Serialize};

use crate::error::UpstreamError;

/// Live log lines from the upstream, one `String` per received event.
/// The stream ends when the upstream closes the connection; the consumer
/// owns the reconnect policy.
pub type LogLineStream = Pin<Box<dyn Stream<Item = Result<String, UpstreamError>> + Send>>;

/// Upstream connection parameters.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the upstream, e.g. `http://127.0.0.1:7861`.
    pub base_url: String,
    /// Access password. The upstream hands back a bearer token on login.
    pub password: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:7861".to_string(),
            password: String::new(),
            timeout_secs: 30,
        }
    }
}

/// Result of a single verify/recover call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifyResult {
    /// Whether the upstream considers the credential recovered.
    pub success: bool,
    /// Upstream message, if any.
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CredsStatusResponse {
    #[serde(default)]
    pub items: Vec<CredItem>,
}

/// One item of the upstream `/creds/status` listing.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CredItem {
    pub filename: String,
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub error_codes: Vec<u16>,
    /// Credential mode; only "antigravity" exposes per-model quota.
    #[serde(default = "default_mode")]
    pub mode: String,
}

fn default_mode() -> String {
    "antigravity".to_string()
}

#[derive(Debug, Deserialize)]
pub(crate) struct VerifyResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuotaResponse {
    #[serde(default)]
    pub models: Vec<ModelQuota>,
}
