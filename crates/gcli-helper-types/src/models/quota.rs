//! Quota data models.

use serde::{Deserialize, Serialize};

/// Status tier derived from a model's remaining quota ratio.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuotaTier {
    /// Plenty of quota remaining.
    Ok,
    /// Remaining ratio below the low threshold.
    Low,
    /// Remaining ratio below the critical threshold.
    Critical,
}

/// Tier thresholds as remaining-ratio cutoffs. Configuration values, not
/// hardcoded constants, so operators can tune them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct QuotaThresholds {
    /// Remaining ratio below which a model counts as low.
    pub low: f64,
    /// Remaining ratio below which a model counts as critical.
    pub critical: f64,
}

impl Default for QuotaThresholds {
    fn default() -> Self {
        Self { low: 0.3, critical: 0.1 }
    }
}

/// Per-model usage/limit pair reported by the upstream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelQuota {
    /// Model name
    pub model: String,
    /// Units consumed in the current window
    pub used: u64,
    /// Window limit
    pub limit: u64,
}

impl ModelQuota {
    /// Fraction of the limit still available, in `[0.0, 1.0]`.
    /// A zero limit counts as fully exhausted.
    pub fn remaining_ratio(&self) -> f64 {
        if self.limit == 0 {
            return 0.0;
        }
        let used = self.used.min(self.limit);
        #[allow(clippy::cast_precision_loss)]
        let ratio = (self.limit - used) as f64 / self.limit as f64;
        ratio
    }

    /// Classify this model's remaining quota against the given thresholds.
    pub fn tier(&self, thresholds: &QuotaThresholds) -> QuotaTier {
        let remaining = self.remaining_ratio();
        if remaining < thresholds.critical {
            QuotaTier::Critical
        } else if remaining < thresholds.low {
            QuotaTier::Low
        } else {
            QuotaTier::Ok
        }
    }
}

/// Quota availability for one credential.
///
/// Only antigravity-mode credentials expose per-model quota upstream, so
/// "no quota" is a distinct state rather than zero values or an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", content = "data", rename_all = "lowercase")]
pub enum QuotaState {
    /// Per-model quota figures are available.
    Available(Vec<ModelQuota>),
    /// Credential mode does not expose quota data.
    Unsupported,
    /// The per-credential quota fetch failed.
    Error(String),
}

impl QuotaState {
    /// Worst tier across available models, if quota data is present.
    pub fn worst_tier(&self, thresholds: &QuotaThresholds) -> Option<QuotaTier> {
        match self {
            Self::Available(models) => models
                .iter()
                .map(|m| m.tier(thresholds))
                .max_by_key(|t| match t {
                    QuotaTier::Ok => 0,
                    QuotaTier::Low => 1,
                    QuotaTier::Critical => 2,
                }),
            Self::Unsupported | Self::Error(_) => None,
        }
    }
}

/// Quota snapshot for one credential, as served by the quota cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CredentialQuota {
    /// Upstream-assigned credential identifier.
    pub filename: String,
    /// Account email associated with the credential, if known.
    #[serde(default)]
    pub user_email: String,
    /// Whether the upstream has disabled this credential.
    #[serde(default)]
    pub disabled: bool,
    /// Quota availability and figures.
    pub quota: QuotaState,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mq(used: u64, limit: u64) -> ModelQuota {
        ModelQuota { model: "gemini-2.0-flash".to_string(), used, limit }
    }

    #[test]
    fn test_tier_thresholds() {
        let t = QuotaThresholds::default();
        assert_eq!(mq(50, 100).tier(&t), QuotaTier::Ok);
        assert_eq!(mq(80, 100).tier(&t), QuotaTier::Low);
        assert_eq!(mq(95, 100).tier(&t), QuotaTier::Critical);
        assert_eq!(mq(100, 100).tier(&t), QuotaTier::Critical);
    }

    #[test]
    fn test_tier_custom_thresholds() {
        let t = QuotaThresholds { low: 0.5, critical: 0.2 };
        assert_eq!(mq(60, 100).tier(&t), QuotaTier::Low);
        assert_eq!(mq(90, 100).tier(&t), QuotaTier::Critical);
    }

    #[test]
    fn test_zero_limit_is_exhausted() {
        assert_eq!(mq(0, 0).remaining_ratio(), 0.0);
        assert_eq!(mq(0, 0).tier(&QuotaThresholds::default()), QuotaTier::Critical);
    }

    #[test]
    fn test_worst_tier() {
        let t = QuotaThresholds::default();
        let state = QuotaState::Available(vec![mq(10, 100), mq(95, 100)]);
        assert_eq!(state.worst_tier(&t), Some(QuotaTier::Critical));
        assert_eq!(QuotaState::Unsupported.worst_tier(&t), None);
    }

    #[test]
    fn test_quota_state_serde_distinguishes_unsupported() {
        let json = serde_json::to_string(&QuotaState::Unsupported).unwrap();
        assert!(json.contains("unsupported"));
        let parsed: QuotaState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, QuotaState::Unsupported);
    }
}
