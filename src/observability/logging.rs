//! Structured logging.
//!
//! `RUST_LOG` wins over the configured level when set.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

fn default_directives(level: &str) -> String {
    format!("service_layer_gateway={level},tower_http={level}")
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.log_level)));

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_cover_crate_and_http_layer() {
        let directives = default_directives("debug");
        assert!(directives.contains("service_layer_gateway=debug"));
        assert!(directives.contains("tower_http=debug"));
        assert!(EnvFilter::try_new(directives).is_ok());
    }
}
