//! Resilient upstream execution.
//!
//! Wraps one logical upstream call in the breaker, a per-attempt deadline,
//! and bounded retry with backoff:
//!
//! ```text
//! for attempt in 1..=max_attempts:
//!     breaker.try_acquire()        → open: fail fast, no retry
//!     with_deadline(op())          → one HTTP attempt
//!     classify(result)
//!         Completed                → success, return
//!         SessionInvalidated (401) → neutral, return to caller
//!         Rejected                 → neutral, return error
//!         Transient                → failure; circuit now open: fail fast,
//!                                    otherwise back off and retry
//! ```
//!
//! The breaker permit is held across the attempt. If the caller is dropped
//! mid-attempt the permit goes with it and a Half-Open trial slot is freed.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::GatewayConfig;
use crate::error::{GatewayError, UpstreamFailure};
use crate::observability::metrics;
use crate::resilience::circuit_breaker::{CircuitBreaker, CircuitState};
use crate::resilience::retries::{classify, Outcome, RetryPolicy};
use crate::resilience::timeouts::with_deadline;
use crate::upstream::{TransportError, UpstreamResponse};

#[derive(Debug, Clone)]
pub struct ResilientTransport {
    retry: RetryPolicy,
    breaker: Arc<CircuitBreaker>,
    attempt_timeout: Duration,
}

impl ResilientTransport {
    pub fn new(retry: RetryPolicy, breaker: Arc<CircuitBreaker>, attempt_timeout: Duration) -> Self {
        Self {
            retry,
            breaker,
            attempt_timeout,
        }
    }

    pub fn from_config(config: &GatewayConfig, breaker: Arc<CircuitBreaker>) -> Self {
        Self::new(
            RetryPolicy::from_config(&config.retries),
            breaker,
            Duration::from_secs(config.timeouts.request_secs),
        )
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Run `op` until it yields a non-transient outcome or attempts run out.
    ///
    /// A 401 comes back as `Ok`; deciding what to do about it belongs to the
    /// caller, which knows which session produced it.
    pub async fn execute<F, Fut>(&self, label: &str, mut op: F) -> Result<UpstreamResponse, GatewayError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<UpstreamResponse, TransportError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;

            let Ok(permit) = self.breaker.try_acquire() else {
                tracing::warn!(operation = label, "Circuit open, rejecting upstream call");
                return Err(GatewayError::UpstreamUnavailable(UpstreamFailure::CircuitOpen));
            };

            let start = Instant::now();
            let result = with_deadline(self.attempt_timeout, op()).await;
            let status = result.as_ref().map(|r| r.status.as_u16()).unwrap_or(0);
            metrics::record_upstream_request(label, status, start);

            match classify(result) {
                Outcome::Completed(response) => {
                    permit.success();
                    return Ok(response);
                }
                Outcome::SessionInvalidated(response) => {
                    permit.neutral();
                    return Ok(response);
                }
                Outcome::Rejected(e) => {
                    permit.neutral();
                    return Err(GatewayError::Validation(e.to_string()));
                }
                Outcome::Transient(reason) => {
                    permit.failure();

                    if attempt >= self.retry.max_attempts {
                        tracing::error!(
                            operation = label,
                            attempts = attempt,
                            error = %reason,
                            "Upstream call failed, retries exhausted"
                        );
                        return Err(GatewayError::UpstreamUnavailable(
                            UpstreamFailure::RetriesExhausted {
                                attempts: attempt,
                                last_error: reason,
                            },
                        ));
                    }

                    if self.breaker.state() == CircuitState::Open {
                        tracing::warn!(
                            operation = label,
                            attempts = attempt,
                            error = %reason,
                            "Circuit opened during retries, giving up"
                        );
                        return Err(GatewayError::UpstreamUnavailable(UpstreamFailure::CircuitOpen));
                    }

                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(
                        operation = label,
                        attempt,
                        delay = ?delay,
                        error = %reason,
                        "Transient upstream failure, retrying"
                    );
                    metrics::record_retry(label);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
