//! Helper configuration model.

use serde::{Deserialize, Serialize};

use super::quota::QuotaThresholds;

/// Minimum enforced sweep interval. Values below this are clamped up to
/// avoid hammering the upstream.
pub const MIN_INTERVAL_SECS: u64 = 60;

/// Default trigger error codes for the verification scheduler.
pub const DEFAULT_ERROR_CODES: &[u16] = &[400, 403, 429];

fn default_interval() -> u64 {
    300
}

fn default_error_codes() -> Vec<u16> {
    DEFAULT_ERROR_CODES.to_vec()
}

fn default_quota_ttl() -> u64 {
    300
}

fn default_history_limit() -> usize {
    1000
}

fn default_upstream_url() -> String {
    "http://127.0.0.1:7861".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Verification scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifySettings {
    /// Whether scheduled sweeps run at all.
    #[serde(default)]
    pub enabled: bool,
    /// Seconds between sweeps. Clamped to [`MIN_INTERVAL_SECS`].
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    /// Error codes that mark a credential as a verification candidate.
    #[serde(default = "default_error_codes")]
    pub error_codes: Vec<u16>,
}

impl Default for VerifySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_interval(),
            error_codes: default_error_codes(),
        }
    }
}

impl VerifySettings {
    /// Return a copy with the interval floor applied.
    pub fn clamped(mut self) -> Self {
        self.interval_secs = self.interval_secs.max(MIN_INTERVAL_SECS);
        self
    }
}

/// Top-level helper configuration, persisted as JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HelperConfig {
    /// Base URL of the upstream credential proxy.
    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,
    /// Upstream access password/token.
    #[serde(default)]
    pub upstream_password: String,
    /// Upstream HTTP timeout in seconds.
    #[serde(default = "default_timeout")]
    pub upstream_timeout_secs: u64,
    /// Verification scheduler settings.
    #[serde(default)]
    pub verify: VerifySettings,
    /// Quota cache time-to-live in seconds.
    #[serde(default = "default_quota_ttl")]
    pub quota_ttl_secs: u64,
    /// Quota tier thresholds.
    #[serde(default)]
    pub quota_thresholds: QuotaThresholds,
    /// Maximum retained history records.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Optional history log file for best-effort persistence.
    #[serde(default)]
    pub history_file: Option<std::path::PathBuf>,
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            upstream_url: default_upstream_url(),
            upstream_password: String::new(),
            upstream_timeout_secs: default_timeout(),
            verify: VerifySettings::default(),
            quota_ttl_secs: default_quota_ttl(),
            quota_thresholds: QuotaThresholds::default(),
            history_limit: default_history_limit(),
            history_file: None,
        }
    }
}

impl HelperConfig {
    /// Apply invariants that must hold regardless of what was loaded:
    /// the sweep interval floor and a sane TTL.
    pub fn normalized(mut self) -> Self {
        self.verify = self.verify.clamped();
        self.quota_ttl_secs = self.quota_ttl_secs.max(MIN_INTERVAL_SECS);
        self
    }
}
