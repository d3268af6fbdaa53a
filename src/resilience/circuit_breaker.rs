//! Circuit breaker for upstream protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: upstream assumed down, calls fail fast
//! - Half-Open: one trial call decides whether the upstream recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive handled failures >= threshold
//! Open → Half-Open: after cooldown, on the next call
//! Half-Open → Closed: trial call succeeds
//! Half-Open → Open: trial call fails (cooldown restarts)
//! ```
//!
//! One breaker guards the whole upstream and is shared by every call in the
//! process. State is process-local and starts Closed.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::config::CircuitBreakerConfig;
use crate::observability::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

/// Returned when a call is short-circuited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("circuit breaker is open")]
pub struct CircuitOpen;

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    cooldown: Duration,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            cooldown,
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                trial_in_flight: false,
            }),
        }
    }

    pub fn from_config(config: &CircuitBreakerConfig) -> Self {
        Self::new(
            config.failure_threshold,
            Duration::from_secs(config.cooldown_secs),
        )
    }

    // Critical sections never panic, so a poisoned lock still holds a consistent state.
    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ask permission for one attempt.
    ///
    /// The permit must be settled with the attempt's outcome. A permit dropped
    /// unsettled (the caller went away mid-call) gives its trial slot back.
    pub fn try_acquire(&self) -> Result<Permit<'_>, CircuitOpen> {
        let mut inner = self.lock();
        let trial = match inner.state {
            CircuitState::Closed => false,
            CircuitState::Open => {
                let cooled_down = inner
                    .opened_at
                    .map(|opened| opened.elapsed() >= self.cooldown)
                    .unwrap_or(true);
                if !cooled_down {
                    return Err(CircuitOpen);
                }
                inner.state = CircuitState::HalfOpen;
                inner.trial_in_flight = true;
                metrics::record_circuit_state(CircuitState::HalfOpen);
                tracing::info!("Circuit breaker half-open, allowing one trial call");
                true
            }
            CircuitState::HalfOpen => {
                if inner.trial_in_flight {
                    return Err(CircuitOpen);
                }
                inner.trial_in_flight = true;
                true
            }
        };
        Ok(Permit {
            breaker: self,
            trial,
            settled: false,
        })
    }

    pub fn record_success(&self) {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => inner.consecutive_failures = 0,
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Closed;
                inner.consecutive_failures = 0;
                inner.opened_at = None;
                inner.trial_in_flight = false;
                metrics::record_circuit_state(CircuitState::Closed);
                tracing::info!("Circuit breaker reset");
            }
            // Late result of an attempt admitted before the circuit opened.
            CircuitState::Open => {}
        }
    }

    pub fn record_failure(&self) {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.failure_threshold {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                    metrics::record_circuit_state(CircuitState::Open);
                    tracing::error!(
                        failures = inner.consecutive_failures,
                        cooldown_secs = self.cooldown.as_secs(),
                        "Circuit breaker opened"
                    );
                }
            }
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
                inner.trial_in_flight = false;
                metrics::record_circuit_state(CircuitState::Open);
                tracing::warn!("Circuit breaker trial call failed, reopening");
            }
            CircuitState::Open => {}
        }
    }

    /// Outcome that says nothing about upstream health (e.g. a 401).
    ///
    /// Leaves the failure count alone; in Half-Open it frees the trial slot
    /// so the next call can probe instead.
    pub fn record_neutral(&self) {
        self.release_trial();
    }

    fn release_trial(&self) {
        let mut inner = self.lock();
        if inner.state == CircuitState::HalfOpen {
            inner.trial_in_flight = false;
        }
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }

    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }
}

/// Admission for one attempt, handed out by [`CircuitBreaker::try_acquire`].
#[must_use = "settle the permit with the attempt's outcome"]
#[derive(Debug)]
pub struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    trial: bool,
    settled: bool,
}

impl Permit<'_> {
    /// Whether this attempt is the Half-Open trial.
    pub fn is_trial(&self) -> bool {
        self.trial
    }

    pub fn success(mut self) {
        self.settled = true;
        self.breaker.record_success();
    }

    pub fn failure(mut self) {
        self.settled = true;
        self.breaker.record_failure();
    }

    /// Settle without a verdict on upstream health.
    pub fn neutral(mut self) {
        self.settled = true;
        if self.trial {
            self.breaker.release_trial();
        }
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.trial {
            tracing::warn!("Circuit breaker trial call abandoned, releasing trial slot");
            self.breaker.release_trial();
        }
    }
}
