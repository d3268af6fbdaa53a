//! Startup orchestration.
//!
//! Fail fast: a store that cannot be reached at startup aborts the process
//! instead of failing every request later.

use std::sync::Arc;

use crate::config::{GatewayConfig, SessionBackend};
use crate::error::GatewayError;
use crate::http::server::AppState;
use crate::session::{MemorySessionStore, RedisSessionStore, SessionStore};

pub async fn connect_store(config: &GatewayConfig) -> Result<Arc<dyn SessionStore>, GatewayError> {
    match config.session.backend {
        SessionBackend::Redis => {
            let store = RedisSessionStore::connect(&config.session.redis_url, config.session.key.clone()).await?;
            store.ping().await?;
            Ok(Arc::new(store))
        }
        SessionBackend::Memory => {
            tracing::warn!("Using in-memory session store; sessions are not shared across instances");
            Ok(Arc::new(MemorySessionStore::new()))
        }
    }
}

/// Connect the configured store and assemble the application state.
pub async fn build_state(config: GatewayConfig) -> Result<AppState, GatewayError> {
    let store = connect_store(&config).await?;
    let state = AppState::build(config, store)?;
    tracing::info!(
        upstream = %state.config.upstream.base_url,
        session_backend = state.sessions.store().backend_name(),
        environment = state.config.environment.as_str(),
        "Gateway state initialized"
    );
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend_builds_state() {
        let mut config = GatewayConfig::default();
        config.upstream.base_url = "http://127.0.0.1:1/b1s/v1".to_string();
        config.session.backend = SessionBackend::Memory;

        let state = build_state(config).await.unwrap();
        assert_eq!(state.sessions.store().backend_name(), "memory");
        assert!(!state.sessions.has_session().await.unwrap());
    }
}
