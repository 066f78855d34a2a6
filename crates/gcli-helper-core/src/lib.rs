//! # gcli-helper Core
//!
//! Business logic for the gcli2api helper:
//!
//! ```text
//! gcli-helper-core/src/modules/
//! ├── upstream.rs     # UpstreamApi trait over the HTTP client
//! ├── scheduler.rs    # Verification sweeps (timer + manual trigger)
//! ├── quota_cache.rs  # TTL-cached quota snapshots
//! ├── history.rs      # Bounded verification history
//! ├── broadcast.rs    # Live log fan-out
//! ├── log_forwarder.rs # Upstream log stream -> broadcaster bridge
//! ├── stats.rs        # Model usage counters from upstream log lines
//! └── config.rs       # Config persistence
//! ```
//!
//! The scheduler and cache never talk HTTP directly; they go through the
//! [`modules::upstream::UpstreamApi`] trait so tests can substitute mocks.

pub mod modules;

pub use modules::broadcast::LogBroadcaster;
pub use modules::history::HistoryStore;
pub use modules::log_forwarder::{LogForwarder, LogForwarderStatus};
pub use modules::quota_cache::{QuotaCache, QuotaCacheStatus, QuotaReport, QuotaSnapshot};
pub use modules::scheduler::{SchedulerStatus, SweepSummary, VerifyScheduler};
pub use modules::stats::ModelStatsService;
pub use modules::upstream::{SharedUpstream, UpstreamApi};
