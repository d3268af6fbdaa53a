//! Session credential storage.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::error::GatewayError;

/// Key/value slot holding the shared session credential.
///
/// `put` overwrites atomically and restarts the expiry. `get` never returns an
/// expired credential. Backend failures are errors, not absent values.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self) -> Result<Option<String>, GatewayError>;

    async fn put(&self, token: &str, ttl: Duration) -> Result<(), GatewayError>;

    /// Reachability check for health reporting.
    async fn ping(&self) -> Result<(), GatewayError>;

    fn backend_name(&self) -> &'static str;
}

#[derive(Debug)]
struct Entry {
    token: String,
    expires_at: Instant,
}

/// Process-local store for development and tests.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: RwLock<Option<Entry>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self) -> Result<Option<String>, GatewayError> {
        let slot = self.slot.read().await;
        Ok(slot
            .as_ref()
            .filter(|entry| Instant::now() < entry.expires_at)
            .map(|entry| entry.token.clone()))
    }

    async fn put(&self, token: &str, ttl: Duration) -> Result<(), GatewayError> {
        if ttl.is_zero() {
            return Err(GatewayError::Internal(
                "session credential must be stored with an expiry".to_string(),
            ));
        }
        *self.slot.write().await = Some(Entry {
            token: token.to_string(),
            expires_at: Instant::now() + ttl,
        });
        Ok(())
    }

    async fn ping(&self) -> Result<(), GatewayError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
