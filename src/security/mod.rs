//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (preflight and origin checks)
//!     → auth.rs (bearer API key → Principal, when keys are configured)
//!     → rate_limit.rs (fixed window per principal or client IP)
//!     → handler
//! Outgoing response:
//!     → headers.rs (security response headers)
//! ```
//!
//! # Design Decisions
//! - Fail closed: a configured key list means every protected route needs a key
//! - `/login` and `/health` are never behind API keys

pub mod auth;
pub mod cors;
pub mod headers;
pub mod rate_limit;

pub use auth::{require_api_key, ApiKeys, Principal};
pub use rate_limit::{rate_limit_middleware, RateLimiter};
