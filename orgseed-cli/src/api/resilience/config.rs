//! Request limits for talking to an org
//!
//! Combines the retry policy, the number of count queries allowed in flight
//! and the HTTP timeout. Built from the `[api]` settings section.

use super::retry::RetryConfig;
use crate::config::ApiSettings;
use std::time::Duration;

/// Count queries in flight when the settings name no limit.
/// Sandboxes start rejecting requests well before production orgs do.
pub const DEFAULT_IN_FLIGHT: usize = 4;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct ResilienceConfig {
    pub retry: RetryConfig,
    /// `None` lets every count query run at once
    pub max_in_flight: Option<usize>,
    pub request_timeout: Duration,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            max_in_flight: Some(DEFAULT_IN_FLIGHT),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ResilienceConfig {
    pub fn builder() -> ResilienceBuilder {
        ResilienceBuilder::default()
    }

    /// Read the `[api]` section; unset values keep their defaults
    pub fn from_settings(settings: &ApiSettings) -> Self {
        let mut builder = Self::builder()
            .jitter(settings.retry_jitter)
            .timeout(Duration::from_secs(settings.request_timeout_secs));

        builder = match (settings.retry_enabled, settings.retry_max_attempts) {
            (false, _) => builder.attempts(1),
            (true, Some(attempts)) => builder.attempts(attempts),
            (true, None) => builder,
        };
        if let Some(ms) = settings.retry_base_delay_ms {
            builder = builder.base_delay(Duration::from_millis(ms));
        }
        if let Some(ms) = settings.retry_max_delay_ms {
            builder = builder.max_delay(Duration::from_millis(ms));
        }

        let in_flight = settings
            .concurrency_enabled
            .then(|| settings.max_concurrent_requests.unwrap_or(DEFAULT_IN_FLIGHT));
        builder.in_flight(in_flight).build()
    }

    /// Width of the buffered count stream, never zero
    pub fn concurrency_limit(&self) -> usize {
        self.max_in_flight.map_or(usize::MAX, |limit| limit.max(1))
    }
}

#[derive(Debug, Default)]
pub struct ResilienceBuilder {
    config: ResilienceConfig,
}

impl ResilienceBuilder {
    /// Total attempts per call; 1 turns retrying off
    pub fn attempts(mut self, attempts: u32) -> Self {
        self.config.retry.max_attempts = attempts.max(1);
        self
    }

    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.config.retry.base_delay = delay;
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.config.retry.max_delay = delay;
        self
    }

    pub fn jitter(mut self, jitter: bool) -> Self {
        self.config.retry.jitter = jitter;
        self
    }

    pub fn in_flight(mut self, limit: Option<usize>) -> Self {
        self.config.max_in_flight = limit;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn build(self) -> ResilienceConfig {
        self.config
    }
}
