//! Verification scheduler.
//!
//! Timer-driven sweeps over upstream credentials: list, filter by the
//! configured trigger error codes (or disabled status), verify each
//! candidate sequentially, record every outcome. Manual triggers share the
//! same sweep lock as the timer — at most one sweep is ever in flight.
//!
//! The background task is one 60s ticker that reloads settings each tick
//! and sweeps once the configured interval has elapsed, so configuration
//! changes take effect without restarting the task and disabling the
//! scheduler stops future sweeps without interrupting a running one.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::time::{interval, Duration, MissedTickBehavior};

use gcli_helper_types::{
    HelperError, HelperResult, TriggerReason, VerificationRecord, VerifyOutcome, VerifySettings,
};

use super::broadcast::LogBroadcaster;
use super::history::HistoryStore;
use super::upstream::{SharedUpstream, UpstreamApi};

/// Ticker period for the background task. The effective sweep interval is
/// the configured one; this only bounds how quickly config changes and
/// elapsed intervals are noticed.
const TICK_SECS: u64 = 60;

/// Counters for one completed sweep.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct SweepSummary {
    /// Credentials that matched the candidate filter.
    pub candidates: usize,
    pub success: usize,
    pub failure: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub enabled: bool,
    pub interval_secs: u64,
    pub error_codes: Vec<u16>,
    /// Whether a sweep holds the lock right now.
    pub running: bool,
    pub last_run: Option<DateTime<Utc>>,
}

pub struct VerifyScheduler {
    settings: RwLock<VerifySettings>,
    // Sweep mutual exclusion: timer and manual triggers both contend here.
    sweep_lock: Mutex<()>,
    last_run: RwLock<Option<DateTime<Utc>>>,
    history: Arc<HistoryStore>,
    broadcaster: Arc<LogBroadcaster>,
}

impl VerifyScheduler {
    pub fn new(
        settings: VerifySettings,
        history: Arc<HistoryStore>,
        broadcaster: Arc<LogBroadcaster>,
    ) -> Self {
        Self {
            settings: RwLock::new(settings.clamped()),
            sweep_lock: Mutex::new(()),
            last_run: RwLock::new(None),
            history,
            broadcaster,
        }
    }

    /// Atomically replace the scheduler settings. The interval floor is
    /// applied here so no caller can configure sub-60s sweeps.
    pub async fn configure(&self, settings: VerifySettings) {
        let settings = settings.clamped();
        tracing::info!(
            "[Scheduler] Configured: enabled={}, interval={}s, error_codes={:?}",
            settings.enabled,
            settings.interval_secs,
            settings.error_codes
        );
        *self.settings.write().await = settings;
    }

    pub async fn settings(&self) -> VerifySettings {
        self.settings.read().await.clone()
    }

    pub async fn status(&self) -> SchedulerStatus {
        let settings = self.settings().await;
        SchedulerStatus {
            enabled: settings.enabled,
            interval_secs: settings.interval_secs,
            error_codes: settings.error_codes,
            running: self.sweep_lock.try_lock().is_err(),
            last_run: *self.last_run.read().await,
        }
    }

    /// Attempt an immediate manual sweep. Fails with `AlreadyRunning` when
    /// a sweep (scheduled or manual) holds the lock.
    pub async fn trigger_now(&self, upstream: &dyn UpstreamApi) -> HelperResult<SweepSummary> {
        let Ok(_guard) = self.sweep_lock.try_lock() else {
            return Err(HelperError::AlreadyRunning);
        };
        self.sweep(upstream, TriggerReason::Manual).await
    }

    /// Timer entry point: skip silently (with a log line and a skipped
    /// record) when a sweep is already in flight.
    pub async fn run_scheduled(&self, upstream: &dyn UpstreamApi) {
        let Ok(_guard) = self.sweep_lock.try_lock() else {
            self.broadcaster.publish("Scheduled sweep skipped: a sweep is already running");
            self.history
                .append(VerificationRecord::now(
                    "",
                    TriggerReason::Scheduled,
                    VerifyOutcome::Skipped,
                    Some("sweep already in flight".to_string()),
                ))
                .await;
            return;
        };
        // Outcome already recorded per candidate; an abort was logged too.
        let _ = self.sweep(upstream, TriggerReason::Scheduled).await;
    }

    /// Spawn the background ticker. Runs until the returned handle is
    /// aborted (process shutdown).
    pub fn spawn(self: Arc<Self>, upstream: SharedUpstream) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!("[Scheduler] Verification scheduler task started");
            let mut tick = interval(Duration::from_secs(TICK_SECS));
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tick.tick().await;

                let settings = self.settings().await;
                if !settings.enabled {
                    continue;
                }
                if !sweep_due(*self.last_run.read().await, settings.interval_secs, Utc::now()) {
                    continue;
                }

                let Some(client) = upstream.read().await.clone() else {
                    tracing::debug!("[Scheduler] Sweep due but upstream not connected");
                    continue;
                };
                self.run_scheduled(client.as_ref()).await;
            }
        })
    }

    /// One full pass over candidate credentials. Caller holds the sweep
    /// lock.
    async fn sweep(
        &self,
        upstream: &dyn UpstreamApi,
        reason: TriggerReason,
    ) -> HelperResult<SweepSummary> {
        let settings = self.settings().await;
        self.broadcaster.publish(format!(
            "Sweep started ({:?} trigger), target error codes {:?}",
            reason, settings.error_codes
        ));

        let credentials = match upstream.list_credentials().await {
            Ok(creds) => creds,
            Err(err) => {
                // Upstream unreachable at the listing stage: abort early
                // with a single failure record.
                let detail = err.to_string();
                self.broadcaster.publish(format!("Sweep aborted: {}", detail));
                self.history
                    .append(VerificationRecord::now(
                        "",
                        reason,
                        VerifyOutcome::Failure,
                        Some(detail),
                    ))
                    .await;
                self.finish_sweep().await;
                return Err(HelperError::from(err));
            }
        };

        let candidates: Vec<_> = credentials
            .into_iter()
            .filter(|c| c.needs_verification(&settings.error_codes))
            .collect();

        let mut summary = SweepSummary { candidates: candidates.len(), ..Default::default() };
        if candidates.is_empty() {
            self.broadcaster.publish("Sweep complete: no credentials need verification");
            self.finish_sweep().await;
            return Ok(summary);
        }

        self.broadcaster
            .publish(format!("Found {} credential(s) to verify", candidates.len()));

        // Sequential on purpose: the upstream is rate sensitive.
        for credential in &candidates {
            let (outcome, detail) = match upstream.verify(&credential.filename).await {
                Ok(result) if result.success => {
                    summary.success += 1;
                    (VerifyOutcome::Success, result.message)
                }
                Ok(result) => {
                    summary.failure += 1;
                    (VerifyOutcome::Failure, result.message)
                }
                Err(err) => {
                    summary.failure += 1;
                    (VerifyOutcome::Failure, Some(err.to_string()))
                }
            };

            self.broadcaster.publish(match (&outcome, &detail) {
                (VerifyOutcome::Success, Some(msg)) => {
                    format!("Verified {}: recovered - {}", credential.filename, msg)
                }
                (VerifyOutcome::Success, None) => {
                    format!("Verified {}: recovered", credential.filename)
                }
                (_, Some(msg)) => format!("Verify {} failed: {}", credential.filename, msg),
                (_, None) => format!("Verify {} failed", credential.filename),
            });
            self.history
                .append(VerificationRecord::now(
                    credential.filename.clone(),
                    reason,
                    outcome,
                    detail,
                ))
                .await;
        }

        self.broadcaster.publish(format!(
            "Sweep complete: {} succeeded, {} failed",
            summary.success, summary.failure
        ));
        self.finish_sweep().await;
        Ok(summary)
    }

    async fn finish_sweep(&self) {
        *self.last_run.write().await = Some(Utc::now());
    }
}

/// Whether the configured interval has elapsed since the last sweep.
fn sweep_due(last_run: Option<DateTime<Utc>>, interval_secs: u64, now: DateTime<Utc>) -> bool {
    match last_run {
        None => true,
        Some(last) => {
            let elapsed = now.signed_duration_since(last).num_seconds();
            elapsed >= i64::try_from(interval_secs).unwrap_or(i64::MAX)
        }
    }
}
