//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, environment overrides)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is loaded once at startup; missing required values abort startup
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::{
    AdminConfig, AuthConfig, CircuitBreakerConfig, CorsConfig, Environment, GatewayConfig,
    ListenerConfig, LogFormat, ObservabilityConfig, RateLimitConfig, RetryConfig, SessionBackend,
    SessionConfig, TimeoutConfig, TlsConfig, UpstreamConfig,
};
