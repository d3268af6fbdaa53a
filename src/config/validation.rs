//! Configuration validation.
//!
//! Serde handles syntax; this module checks that the values the gateway cannot
//! start without are present and in range. All problems are reported at once.

use url::Url;

use crate::config::schema::{GatewayConfig, SessionBackend};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, returning every error found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let upstream = &config.upstream;
    if upstream.base_url.trim().is_empty() {
        errors.push(ValidationError::new("upstream.base_url", "is required"));
    } else if let Err(e) = Url::parse(&upstream.base_url) {
        errors.push(ValidationError::new(
            "upstream.base_url",
            format!("is not a valid URL ({})", e),
        ));
    }
    if upstream.login_path.trim().is_empty() {
        errors.push(ValidationError::new("upstream.login_path", "must not be empty"));
    }
    if upstream.tenant.trim().is_empty() {
        errors.push(ValidationError::new("upstream.tenant", "is required"));
    }
    if upstream.username.trim().is_empty() {
        errors.push(ValidationError::new("upstream.username", "is required"));
    }
    if upstream.password.is_empty() {
        errors.push(ValidationError::new("upstream.password", "is required"));
    }

    if config.session.backend == SessionBackend::Redis && config.session.redis_url.trim().is_empty() {
        errors.push(ValidationError::new(
            "session.redis_url",
            "is required when session.backend = \"redis\"",
        ));
    }
    if config.session.key.is_empty() {
        errors.push(ValidationError::new("session.key", "must not be empty"));
    }
    if config.session.ttl_secs == 0 {
        errors.push(ValidationError::new("session.ttl_secs", "must be greater than 0"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }
    if config.retries.max_attempts == 0 {
        errors.push(ValidationError::new("retries.max_attempts", "must be at least 1"));
    }
    if config.retries.base_delay_ms > config.retries.max_delay_ms {
        errors.push(ValidationError::new(
            "retries.base_delay_ms",
            "must not exceed retries.max_delay_ms",
        ));
    }
    if config.circuit_breaker.failure_threshold == 0 {
        errors.push(ValidationError::new(
            "circuit_breaker.failure_threshold",
            "must be at least 1",
        ));
    }

    if config.rate_limit.enabled {
        if config.rate_limit.permit_limit == 0 {
            errors.push(ValidationError::new("rate_limit.permit_limit", "must be at least 1"));
        }
        if config.rate_limit.window_secs == 0 {
            errors.push(ValidationError::new("rate_limit.window_secs", "must be greater than 0"));
        }
    }

    if config.admin.enabled && config.admin.api_key.trim().is_empty() {
        errors.push(ValidationError::new(
            "admin.api_key",
            "is required when the admin API is enabled",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
