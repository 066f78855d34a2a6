//! # gcli-helper Types
//!
//! Core types, models, and error definitions for the gcli2api helper.
//!
//! This crate sits at the bottom of the dependency graph:
//!
//! ```text
//!              gcli-helper-types (this crate)
//!                      │
//!          ┌───────────┼───────────┐
//!          ▼           ▼           ▼
//!  gcli-helper-client  gcli-helper-core
//!          │           │
//!          └─────┬─────┘
//!                ▼
//!        gcli-helper-server
//! ```
//!
//! All types are designed to be:
//! - **Serializable** via serde for API responses and disk persistence
//! - **Clone** for cheap sharing across async boundaries
//! - **PartialEq** for testing and comparison

pub mod error;
pub mod models;

// Re-export error types for convenience
pub use error::{HelperError, HelperResult};

// Re-export core model types
pub use models::{
    Credential, CredentialQuota, HelperConfig, ModelQuota, ModelUsageStats, QuotaState, QuotaTier,
    QuotaThresholds, TriggerReason, VerificationRecord, VerifyOutcome, VerifySettings,
};
