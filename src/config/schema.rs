//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Deployment environment ("production" hides internal error details).
    pub environment: Environment,

    /// Inbound listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Upstream service location and login identity.
    pub upstream: UpstreamConfig,

    /// Shared session store settings.
    pub session: SessionConfig,

    /// Outbound timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Retry policy for outbound calls.
    pub retries: RetryConfig,

    /// Circuit breaker guarding the upstream.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Inbound rate limiting.
    pub rate_limit: RateLimitConfig,

    /// CORS policy.
    pub cors: CorsConfig,

    /// Inbound caller authentication.
    pub auth: AuthConfig,

    /// Admin API settings.
    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl GatewayConfig {
    /// Internal error details are only exposed outside production.
    pub fn expose_error_details(&self) -> bool {
        self.environment != Environment::Production
    }
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Development,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Development => "development",
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" => Ok(Environment::Development),
            other => Err(format!("unknown environment '{}'", other)),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,

    /// Upper bound on the total time spent serving one inbound request.
    pub request_timeout_secs: u64,

    /// Maximum inbound body size in bytes.
    pub max_body_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
            request_timeout_secs: 120,
            max_body_size: 2 * 1024 * 1024,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Upstream service configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL all relative resource paths are resolved against
    /// (e.g., "https://sap:50000/b1s/v1/").
    pub base_url: String,

    /// Login resource, relative to `base_url`.
    pub login_path: String,

    /// Tenant (company database) selector.
    pub tenant: String,

    /// Login user name.
    pub username: String,

    /// Login password.
    pub password: String,

    /// Accept self-signed upstream certificates.
    pub accept_invalid_certs: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            login_path: "Login".to_string(),
            tenant: String::new(),
            username: String::new(),
            password: String::new(),
            accept_invalid_certs: false,
        }
    }
}

impl std::fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("base_url", &self.base_url)
            .field("login_path", &self.login_path)
            .field("tenant", &self.tenant)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

/// Session store backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    #[default]
    Redis,
    /// Process-local slot; only suitable for a single instance or development.
    Memory,
}

/// Session store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Which store holds the shared session credential.
    pub backend: SessionBackend,

    /// Redis connection string (e.g., "redis://127.0.0.1:6379").
    pub redis_url: String,

    /// Key of the shared session slot.
    pub key: String,

    /// Lifetime of a stored session credential in seconds.
    pub ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackend::Redis,
            redis_url: String::new(),
            key: "SL_Session_Cookie".to_string(),
            ttl_secs: 30 * 60,
        }
    }
}

/// Timeout configuration for outbound calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Per-attempt deadline (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per outbound call, including the first one.
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds; doubles per attempt.
    pub base_delay_ms: u64,

    /// Maximum delay between attempts in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 8000,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive handled failures before the circuit opens.
    pub failure_threshold: u32,

    /// Seconds the circuit stays open before a trial call is allowed.
    pub cooldown_secs: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown_secs: 30,
        }
    }
}

/// Rate limiting configuration (fixed window per caller).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Requests allowed per caller per window.
    pub permit_limit: u32,

    /// Window length in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            permit_limit: 100,
            window_secs: 60,
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins. Empty means any origin (development only).
    pub allowed_origins: Vec<String>,
}

/// Inbound caller authentication.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Accepted bearer keys. Empty disables inbound authentication.
    pub api_keys: Vec<String>,
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level filter used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
