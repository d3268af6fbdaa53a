//! Upstream service access.
//!
//! # Data Flow
//! ```text
//! Forwarder / SessionManager
//!     → resilience::ResilientTransport (retry, circuit breaker, deadline)
//!     → client.rs (one HTTP attempt, cookie attached)
//!     → response.rs (buffered status + headers + body)
//! ```

pub mod client;
pub mod response;

pub use client::{Credentials, TransportError, UpstreamClient};
pub use response::UpstreamResponse;
