//! Application State
//!
//! Holds shared state for the helper daemon: configuration, the upstream
//! connection slot, and the long-lived services (scheduler, quota cache,
//! history, log fan-out, model stats).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use gcli_helper_client::{ClientConfig, UpstreamClient, UpstreamError};
use gcli_helper_core::modules::config::{config_path, load_config, save_config};
use gcli_helper_core::{
    HistoryStore, LogBroadcaster, LogForwarder, ModelStatsService, QuotaCache, SharedUpstream,
    UpstreamApi, VerifyScheduler,
};
use gcli_helper_types::{HelperConfig, HelperResult};

const STATS_FILE: &str = "model_stats.json";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub(crate) inner: Arc<AppStateInner>,
}

pub struct AppStateInner {
    pub config_path: PathBuf,
    pub config: RwLock<HelperConfig>,
    /// Currently connected upstream client, `None` before the first
    /// successful connect. The scheduler ticker reads this slot too.
    pub upstream: SharedUpstream,
    pub scheduler: Arc<VerifyScheduler>,
    pub quota_cache: Arc<QuotaCache>,
    pub history: Arc<HistoryStore>,
    pub broadcaster: Arc<LogBroadcaster>,
    pub forwarder: Arc<LogForwarder>,
    pub stats: Arc<ModelStatsService>,
}

impl AppState {
    /// Load configuration from the data directory and build all services.
    pub async fn new(data_dir: &Path) -> HelperResult<Self> {
        tokio::fs::create_dir_all(data_dir).await?;

        let config_path = config_path(data_dir);
        let config = load_config(&config_path).await?;

        let broadcaster = Arc::new(LogBroadcaster::new());
        let history =
            Arc::new(HistoryStore::new(config.history_limit, config.history_file.clone()));
        let scheduler = Arc::new(VerifyScheduler::new(
            config.verify.clone(),
            Arc::clone(&history),
            Arc::clone(&broadcaster),
        ));
        let quota_cache = Arc::new(QuotaCache::new(Duration::from_secs(config.quota_ttl_secs)));
        let forwarder = Arc::new(LogForwarder::new(Arc::clone(&broadcaster)));
        let stats = Arc::new(ModelStatsService::load(Some(data_dir.join(STATS_FILE))).await);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config_path,
                config: RwLock::new(config),
                upstream: SharedUpstream::default(),
                scheduler,
                quota_cache,
                history,
                broadcaster,
                forwarder,
                stats,
            }),
        })
    }

    pub async fn config(&self) -> HelperConfig {
        self.inner.config.read().await.clone()
    }

    /// Persist a new configuration and propagate it to the running
    /// services. Invariants (interval floor, TTL floor) are applied first.
    pub async fn apply_config(&self, config: HelperConfig) -> HelperResult<HelperConfig> {
        let config = config.normalized();
        save_config(&self.inner.config_path, &config).await?;

        self.inner.scheduler.configure(config.verify.clone()).await;
        self.inner
            .quota_cache
            .set_ttl(Duration::from_secs(config.quota_ttl_secs))
            .await;

        *self.inner.config.write().await = config.clone();
        Ok(config)
    }

    /// Connect (or reconnect) to the upstream using the stored
    /// configuration and install the client into the shared slot.
    pub async fn connect_upstream(&self) -> Result<(), UpstreamError> {
        let config = self.config().await;
        let client = UpstreamClient::connect(ClientConfig {
            base_url: config.upstream_url.clone(),
            password: config.upstream_password.clone(),
            timeout_secs: config.upstream_timeout_secs,
        })
        .await?;

        *self.inner.upstream.write().await = Some(Arc::new(client));
        self.inner
            .broadcaster
            .publish(format!("Connected to upstream at {}", config.upstream_url));
        Ok(())
    }

    pub async fn upstream(&self) -> Option<Arc<dyn UpstreamApi>> {
        self.inner.upstream.read().await.clone()
    }

    /// Spawn the long-running background tasks: the scheduler ticker, the
    /// upstream log forwarder, and the stats feed that inspects every
    /// broadcast line (forwarded upstream logs included) for usage data.
    pub fn spawn_background_tasks(&self) {
        let _ticker = Arc::clone(&self.inner.scheduler).spawn(Arc::clone(&self.inner.upstream));

        let stats = Arc::clone(&self.inner.stats);
        let mut rx = self.inner.broadcaster.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(line) => stats.observe_line(&line).await,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("[Stats] Feed lagged, {} lines skipped", n);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        // Last: upstream log lines must find the stats feed subscribed.
        let _forwarder = Arc::clone(&self.inner.forwarder).spawn(Arc::clone(&self.inner.upstream));
    }
}
