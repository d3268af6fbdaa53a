//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {message}")]
    Env { var: &'static str, message: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, override from the process environment, and validate a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: GatewayConfig = toml::from_str(&content)?;
    finish(&mut config)?;
    Ok(config)
}

/// Build a configuration from defaults and the process environment only.
pub fn load_from_env() -> Result<GatewayConfig, ConfigError> {
    let mut config = GatewayConfig::default();
    finish(&mut config)?;
    Ok(config)
}

fn finish(config: &mut GatewayConfig) -> Result<(), ConfigError> {
    apply_env_overrides(config, |var| std::env::var(var).ok())?;
    validate_config(config).map_err(ConfigError::Validation)
}

/// Overlay environment variables onto `config`.
///
/// `lookup` abstracts the environment so overrides can be exercised without
/// touching process-global state.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    let set = |var: &'static str, target: &mut String| {
        if let Some(value) = lookup(var).filter(|v| !v.is_empty()) {
            *target = value;
        }
    };

    set("SERVICE_LAYER_BASE_URL", &mut config.upstream.base_url);
    set("SERVICE_LAYER_COMPANY_DB", &mut config.upstream.tenant);
    set("SERVICE_LAYER_USERNAME", &mut config.upstream.username);
    set("SERVICE_LAYER_PASSWORD", &mut config.upstream.password);
    set("REDIS_CONFIGURATION", &mut config.session.redis_url);
    set("ADMIN_API_KEY", &mut config.admin.api_key);

    if let Some(origins) = lookup("CORS_ALLOWED_ORIGINS") {
        config.cors.allowed_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect();
    }

    if let Some(keys) = lookup("GATEWAY_API_KEYS") {
        config.auth.api_keys = keys
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(String::from)
            .collect();
    }

    if let Some(value) = lookup("RATE_LIMIT_PERMIT_LIMIT") {
        config.rate_limit.permit_limit = parse_number("RATE_LIMIT_PERMIT_LIMIT", &value)?;
    }
    if let Some(value) = lookup("RATE_LIMIT_WINDOW_SECONDS") {
        config.rate_limit.window_secs = parse_number("RATE_LIMIT_WINDOW_SECONDS", &value)?;
    }

    if let Some(value) = lookup("GATEWAY_ENVIRONMENT") {
        config.environment = value.parse().map_err(|message| ConfigError::Env {
            var: "GATEWAY_ENVIRONMENT",
            message,
        })?;
    }

    Ok(())
}

fn parse_number<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Env {
        var,
        message: e.to_string(),
    })
}
