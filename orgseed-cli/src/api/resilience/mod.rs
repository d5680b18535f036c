//! Resilience features for org API calls
//!
//! Provides retry policies and concurrency settings for describe and query
//! traffic against the source org.

pub mod config;
pub mod retry;

pub use config::ResilienceConfig;
pub use retry::RetryPolicy;
