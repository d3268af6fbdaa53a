//! Session-sharing gateway for a single-login upstream service.
//!
//! Many concurrent clients share one authenticated upstream session. The
//! gateway logs in once, caches the session cookie in a shared store,
//! re-authenticates transparently when the upstream rejects it, and guards
//! every outbound call with retry and a circuit breaker.

// Core subsystems
pub mod config;
pub mod error;
pub mod http;
pub mod proxy;
pub mod quotation;
pub mod session;
pub mod upstream;

// Cross-cutting concerns
pub mod admin;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use http::{AppState, GatewayServer};
pub use lifecycle::Shutdown;
