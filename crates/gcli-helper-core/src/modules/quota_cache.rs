//! TTL-cached quota snapshots.
//!
//! Read-through cache around the upstream's batched quota listing. A fresh
//! entry (age <= TTL) is served without touching the upstream; staleness or
//! a forced refresh triggers one fetch. The refresh mutex is scoped to the
//! whole cache — the listing is one batched request — so concurrent readers
//! during a refresh await the in-flight fetch and reuse its result instead
//! of issuing duplicates.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use gcli_helper_types::{
    CredentialQuota, HelperError, HelperResult, QuotaState, QuotaThresholds, QuotaTier,
};

use super::upstream::UpstreamApi;

struct CacheEntry {
    data: Vec<CredentialQuota>,
    fetched_at: Instant,
    fetched_wall: DateTime<Utc>,
}

/// One credential's quota as served to consumers: the raw snapshot plus
/// the computed status tier (worst tier across its models).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QuotaReport {
    pub filename: String,
    pub user_email: String,
    pub disabled: bool,
    pub quota: QuotaState,
    /// `None` when quota is unsupported or errored for this credential.
    pub tier: Option<QuotaTier>,
}

/// Result of a cache read.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QuotaSnapshot {
    pub items: Vec<QuotaReport>,
    /// Whether this came from cache (true) or a fetch this call performed.
    pub cached: bool,
    /// True when the upstream fetch failed and a prior entry was served.
    pub stale: bool,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuotaCacheStatus {
    pub cache_valid: bool,
    pub cache_count: usize,
    pub cache_time: Option<DateTime<Utc>>,
    pub ttl_secs: u64,
    pub refreshing: bool,
}

pub struct QuotaCache {
    entry: Mutex<Option<CacheEntry>>,
    ttl: RwLock<Duration>,
    // Status reporting only; the entry mutex is the actual refresh lock.
    refreshing: AtomicBool,
}

impl QuotaCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entry: Mutex::new(None),
            ttl: RwLock::new(ttl),
            refreshing: AtomicBool::new(false),
        }
    }

    pub async fn set_ttl(&self, ttl: Duration) {
        *self.ttl.write().await = ttl;
    }

    /// Return the quota snapshot, fetching from the upstream when the
    /// cached entry is missing, expired, or a refresh is forced.
    ///
    /// On fetch failure the prior entry, if any, is served marked stale;
    /// without one the error propagates.
    pub async fn get(
        &self,
        upstream: &dyn UpstreamApi,
        force_refresh: bool,
        thresholds: &QuotaThresholds,
    ) -> HelperResult<QuotaSnapshot> {
        let ttl = *self.ttl.read().await;
        let mut entry = self.entry.lock().await;

        if !force_refresh {
            if let Some(cached) = entry.as_ref() {
                if cached.fetched_at.elapsed() <= ttl {
                    return Ok(snapshot(cached, thresholds, true, false));
                }
            }
        }

        self.refreshing.store(true, Ordering::Relaxed);
        let fetched = upstream.fetch_quotas().await;
        self.refreshing.store(false, Ordering::Relaxed);

        match fetched {
            Ok(data) => {
                let fresh =
                    CacheEntry { data, fetched_at: Instant::now(), fetched_wall: Utc::now() };
                let result = snapshot(&fresh, thresholds, false, false);
                *entry = Some(fresh);
                Ok(result)
            }
            Err(err) => {
                if let Some(prior) = entry.as_ref() {
                    tracing::warn!("[QuotaCache] Refresh failed, serving stale data: {}", err);
                    Ok(snapshot(prior, thresholds, true, true))
                } else {
                    Err(HelperError::from(err))
                }
            }
        }
    }

    pub async fn status(&self) -> QuotaCacheStatus {
        let ttl = *self.ttl.read().await;
        let refreshing = self.refreshing.load(Ordering::Relaxed);

        // Don't block on an in-flight refresh just to report status.
        let (cache_valid, cache_count, cache_time) = match self.entry.try_lock() {
            Ok(entry) => match entry.as_ref() {
                Some(cached) => (
                    cached.fetched_at.elapsed() <= ttl,
                    cached.data.len(),
                    Some(cached.fetched_wall),
                ),
                None => (false, 0, None),
            },
            Err(_) => (false, 0, None),
        };

        QuotaCacheStatus {
            cache_valid,
            cache_count,
            cache_time,
            ttl_secs: ttl.as_secs(),
            refreshing,
        }
    }
}

fn snapshot(
    entry: &CacheEntry,
    thresholds: &QuotaThresholds,
    cached: bool,
    stale: bool,
) -> QuotaSnapshot {
    let items = entry
        .data
        .iter()
        .map(|cq| QuotaReport {
            filename: cq.filename.clone(),
            user_email: cq.user_email.clone(),
            disabled: cq.disabled,
            quota: cq.quota.clone(),
            tier: cq.quota.worst_tier(thresholds),
        })
        .collect();

    QuotaSnapshot { items, cached, stale, fetched_at: entry.fetched_wall }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gcli_helper_client::{UpstreamError, VerifyResult};
    use gcli_helper_types::{Credential, ModelQuota};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    struct CountingUpstream {
        fetches: AtomicUsize,
        fail: AtomicBool,
    }

    impl CountingUpstream {
        fn new() -> Self {
            Self { fetches: AtomicUsize::new(0), fail: AtomicBool::new(false) }
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UpstreamApi for CountingUpstream {
        async fn list_credentials(&self) -> Result<Vec<Credential>, UpstreamError> {
            Ok(vec![])
        }

        async fn verify(&self, _filename: &str) -> Result<VerifyResult, UpstreamError> {
            Ok(VerifyResult { success: true, message: None })
        }

        async fn fetch_quotas(&self) -> Result<Vec<CredentialQuota>, UpstreamError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(UpstreamError::Unreachable("connect refused".to_string()));
            }
            let n = self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(vec![CredentialQuota {
                filename: format!("cred-{}.json", n),
                user_email: String::new(),
                disabled: false,
                quota: QuotaState::Available(vec![ModelQuota {
                    model: "gemini-2.0-flash".to_string(),
                    used: 95,
                    limit: 100,
                }]),
            }])
        }

        async fn probe(&self) -> Result<(), UpstreamError> {
            Ok(())
        }

        async fn stream_logs(&self) -> Result<gcli_helper_client::LogLineStream, UpstreamError> {
            Ok(Box::pin(tokio_stream::iter(Vec::<Result<String, UpstreamError>>::new())))
        }
    }

    fn thresholds() -> QuotaThresholds {
        QuotaThresholds::default()
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_serves_cached_until_expiry() {
        let upstream = CountingUpstream::new();
        let cache = QuotaCache::new(Duration::from_secs(300));

        let first = cache.get(&upstream, false, &thresholds()).await.unwrap();
        assert!(!first.cached);
        assert_eq!(upstream.fetch_count(), 1);

        tokio::time::advance(Duration::from_secs(100)).await;
        let second = cache.get(&upstream, false, &thresholds()).await.unwrap();
        assert!(second.cached);
        assert_eq!(second.items, first.items);

        tokio::time::advance(Duration::from_secs(100)).await;
        assert!(cache.get(&upstream, false, &thresholds()).await.unwrap().cached);
        assert_eq!(upstream.fetch_count(), 1);

        // t=301 relative to the fetch: stale, refetches.
        tokio::time::advance(Duration::from_secs(101)).await;
        let fourth = cache.get(&upstream, false, &thresholds()).await.unwrap();
        assert!(!fourth.cached);
        assert_eq!(upstream.fetch_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_refresh_bypasses_fresh_entry() {
        let upstream = CountingUpstream::new();
        let cache = QuotaCache::new(Duration::from_secs(300));

        cache.get(&upstream, false, &thresholds()).await.unwrap();
        cache.get(&upstream, true, &thresholds()).await.unwrap();
        assert_eq!(upstream.fetch_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failure_serves_stale_entry() {
        let upstream = CountingUpstream::new();
        let cache = QuotaCache::new(Duration::from_secs(300));

        let first = cache.get(&upstream, false, &thresholds()).await.unwrap();
        upstream.fail.store(true, Ordering::SeqCst);

        let stale = cache.get(&upstream, true, &thresholds()).await.unwrap();
        assert!(stale.stale);
        assert_eq!(stale.items, first.items);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failure_without_entry_is_error() {
        let upstream = CountingUpstream::new();
        upstream.fail.store(true, Ordering::SeqCst);
        let cache = QuotaCache::new(Duration::from_secs(300));

        let err = cache.get(&upstream, false, &thresholds()).await.unwrap_err();
        assert!(matches!(err, HelperError::Unreachable(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_reads_share_one_fetch() {
        let upstream = Arc::new(CountingUpstream::new());
        let cache = Arc::new(QuotaCache::new(Duration::from_secs(300)));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let upstream = Arc::clone(&upstream);
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache.get(upstream.as_ref(), false, &QuotaThresholds::default()).await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(upstream.fetch_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tier_computed_per_credential() {
        let upstream = CountingUpstream::new();
        let cache = QuotaCache::new(Duration::from_secs(300));

        let snap = cache.get(&upstream, false, &thresholds()).await.unwrap();
        // 95/100 used => remaining 0.05 < 0.1 critical cutoff.
        assert_eq!(snap.items[0].tier, Some(QuotaTier::Critical));
    }
}
