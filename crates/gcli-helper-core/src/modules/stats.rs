//! Model usage statistics from upstream log lines.
//!
//! The upstream emits usage lines of the form
//! `Model: gemini-2.0-flash-exp | Input: 1000 | Output: 500 | Total: 1500`;
//! this service extracts model name and total tokens from every observed
//! line and keeps monotonically increasing per-model counters. Counters
//! survive restarts via best-effort JSON persistence and reset only on
//! explicit operator action.

use std::path::PathBuf;
use std::sync::Arc;

use regex::Regex;
use tokio::sync::RwLock;

use gcli_helper_types::ModelUsageStats;

const USAGE_PATTERN: &str = r"(?i)Model:\s*([^\s|]+)\s*\|.*?Total:\s*(\d+)";

pub struct ModelStatsService {
    stats: Arc<RwLock<ModelUsageStats>>,
    pattern: Regex,
    persist_path: Option<PathBuf>,
}

impl ModelStatsService {
    pub fn new(persist_path: Option<PathBuf>) -> Self {
        Self {
            stats: Arc::new(RwLock::new(ModelUsageStats::default())),
            #[allow(clippy::expect_used)]
            pattern: Regex::new(USAGE_PATTERN).expect("usage pattern is a valid regex"),
            persist_path,
        }
    }

    /// Create the service and load previously persisted counters, if any.
    pub async fn load(persist_path: Option<PathBuf>) -> Self {
        let service = Self::new(persist_path);
        if let Some(path) = service.persist_path.clone() {
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => match serde_json::from_str::<ModelUsageStats>(&content) {
                    Ok(loaded) => {
                        tracing::info!(
                            "[Stats] Loaded model stats: {} calls, {} tokens",
                            loaded.total_calls,
                            loaded.total_tokens
                        );
                        *service.stats.write().await = loaded;
                    }
                    Err(e) => {
                        tracing::warn!("[Stats] Failed to parse stats file {:?}: {}", path, e);
                    }
                },
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!("[Stats] Failed to read stats file {:?}: {}", path, e);
                }
            }
        }
        service
    }

    /// Inspect one log line; lines without usage information are ignored.
    pub async fn observe_line(&self, line: &str) {
        let Some(captures) = self.pattern.captures(line) else {
            return;
        };
        let (Some(model), Some(total)) = (captures.get(1), captures.get(2)) else {
            return;
        };
        let Ok(tokens) = total.as_str().parse::<u64>() else {
            return;
        };

        self.stats.write().await.record(model.as_str(), tokens);
        self.save_async();
    }

    pub async fn snapshot(&self) -> ModelUsageStats {
        self.stats.read().await.clone()
    }

    /// Reset all counters and restart the counting window.
    pub async fn reset(&self) {
        self.stats.write().await.reset();
        self.save_async();
        tracing::info!("[Stats] Model stats reset");
    }

    fn save_async(&self) {
        let Some(path) = self.persist_path.clone() else {
            return;
        };
        let stats = Arc::clone(&self.stats);
        tokio::spawn(async move {
            let content = {
                let stats = stats.read().await;
                match serde_json::to_string_pretty(&*stats) {
                    Ok(c) => c,
                    Err(e) => {
                        tracing::warn!("[Stats] Failed to serialize stats: {}", e);
                        return;
                    }
                }
            };
            if let Err(e) = tokio::fs::write(&path, content).await {
                tracing::warn!("[Stats] Failed to write stats to {:?}: {}", path, e);
            }
        });
    }
}
