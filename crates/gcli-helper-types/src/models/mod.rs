//! Domain models for the gcli2api helper.

mod config;
mod credential;
mod history;
mod quota;
mod stats;

pub use config::{HelperConfig, VerifySettings, MIN_INTERVAL_SECS};
pub use credential::Credential;
pub use history::{TriggerReason, VerificationRecord, VerifyOutcome};
pub use quota::{CredentialQuota, ModelQuota, QuotaState, QuotaThresholds, QuotaTier};
pub use stats::{ModelCounters, ModelUsageStats};
