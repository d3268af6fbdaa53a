//! Retry policy and failure classification.
//!
//! # Responsibilities
//! - Decide which attempt outcomes are transient (retry-safe)
//! - Bound the number of attempts and the delay between them
//!
//! # Design Decisions
//! - Connection errors, timeouts, 408 and 5xx are transient
//! - 401 is a session signal, never a transport failure: not retried here
//! - Every other status is a completed call and is returned as-is

use std::time::Duration;

use axum::http::StatusCode;

use crate::config::RetryConfig;
use crate::resilience::backoff::calculate_backoff;
use crate::upstream::{TransportError, UpstreamResponse};

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// Delay after failed attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt, self.base_delay, self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// What one attempt against the upstream amounted to.
#[derive(Debug)]
pub enum Outcome {
    /// A response the caller should see; counts as upstream health.
    Completed(UpstreamResponse),
    /// 401: the session is gone. Excluded from breaker accounting.
    SessionInvalidated(UpstreamResponse),
    /// Retry-safe failure, with a description for logs.
    Transient(String),
    /// A failure that retrying cannot fix; the upstream was not contacted.
    Rejected(TransportError),
}

pub fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT
}

pub fn classify(result: Result<UpstreamResponse, TransportError>) -> Outcome {
    match result {
        Ok(response) if is_transient_status(response.status) => {
            Outcome::Transient(format!("upstream answered {}", response.status))
        }
        Ok(response) if response.is_session_invalidated() => Outcome::SessionInvalidated(response),
        Ok(response) => Outcome::Completed(response),
        Err(e) if e.is_transient() => Outcome::Transient(e.to_string()),
        Err(e) => Outcome::Rejected(e),
    }
}
