//! Model usage statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-model call/token counters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelCounters {
    /// Number of observed calls.
    pub calls: u64,
    /// Total tokens across those calls.
    pub tokens: u64,
}

/// Aggregated model usage statistics, incremented from observed upstream
/// usage lines and reset only by explicit operator action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelUsageStats {
    /// Total calls across all models.
    pub total_calls: u64,
    /// Total tokens across all models.
    pub total_tokens: u64,
    /// When counting started (process start or last reset).
    pub start_time: DateTime<Utc>,
    /// Per-model breakdown.
    pub models: HashMap<String, ModelCounters>,
}

impl Default for ModelUsageStats {
    fn default() -> Self {
        Self {
            total_calls: 0,
            total_tokens: 0,
            start_time: Utc::now(),
            models: HashMap::new(),
        }
    }
}

impl ModelUsageStats {
    /// Record one observed call for `model` with `tokens` total tokens.
    pub fn record(&mut self, model: &str, tokens: u64) {
        let counters = self.models.entry(model.to_string()).or_default();
        counters.calls += 1;
        counters.tokens += tokens;
        self.total_calls += 1;
        self.total_tokens += tokens;
    }

    /// Reset all counters and restart the counting window.
    pub fn reset(&mut self) {
        self.models.clear();
        self.total_calls = 0;
        self.total_tokens = 0;
        self.start_time = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accumulates() {
        let mut stats = ModelUsageStats::default();
        stats.record("gemini-2.0-flash", 1500);
        stats.record("gemini-2.0-flash", 500);
        stats.record("gemini-pro", 100);

        assert_eq!(stats.total_calls, 3);
        assert_eq!(stats.total_tokens, 2100);
        assert_eq!(stats.models["gemini-2.0-flash"].calls, 2);
        assert_eq!(stats.models["gemini-2.0-flash"].tokens, 2000);
    }

    #[test]
    fn test_reset_clears_counters() {
        let mut stats = ModelUsageStats::default();
        stats.record("gemini-pro", 100);
        stats.reset();

        assert_eq!(stats.total_calls, 0);
        assert_eq!(stats.total_tokens, 0);
        assert!(stats.models.is_empty());
    }
}
