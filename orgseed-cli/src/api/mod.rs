//! Org API Module
//!
//! The describe and query capabilities the exporter consumes from the source
//! org, a REST implementation of them, SOQL query building, and the retry and
//! concurrency settings applied to API traffic.

pub mod client;
pub mod metadata;
pub mod models;
pub mod query;
pub mod resilience;

pub use client::{OrgApi, RestClient};
pub use models::Session;
pub use resilience::ResilienceConfig;
