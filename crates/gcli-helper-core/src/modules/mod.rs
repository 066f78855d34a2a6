//! Core helper modules.

pub mod broadcast;
pub mod config;
pub mod history;
pub mod log_forwarder;
pub mod quota_cache;
pub mod scheduler;
pub mod stats;
pub mod upstream;
