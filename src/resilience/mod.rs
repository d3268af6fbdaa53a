//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream call:
//!     → circuit_breaker.rs (fail fast while the upstream is known down)
//!     → timeouts.rs (deadline on each attempt)
//!     → retries.rs (classify outcome; transient → backoff.rs, try again)
//! ```
//!
//! # Design Decisions
//! - Every external call has a deadline
//! - Retries are bounded in count and delay
//! - 401 is a session matter and never counts against the upstream's health
//! - `transport.rs` composes the pieces; callers never sequence them by hand

pub mod backoff;
pub mod circuit_breaker;
pub mod retries;
pub mod timeouts;
pub mod transport;

pub use circuit_breaker::{CircuitBreaker, CircuitState, Permit};
pub use retries::RetryPolicy;
pub use transport::ResilientTransport;
