//! # gcli-helper Client
//!
//! Thin HTTP client for the gcli2api upstream credential proxy. Wraps the
//! upstream's login, credential listing, verify and quota endpoints with
//! auth header injection, explicit timeouts and response parsing.
//!
//! No automatic retries: sweep-level retry policy lives in the scheduler,
//! which simply tries again on the next tick.

mod client;
mod error;
mod types;

pub use client::UpstreamClient;
pub use error::UpstreamError;
pub use types::{ClientConfig, LogLineStream, VerifyResult};
