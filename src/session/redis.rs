//! Redis-backed session store.
//!
//! One key holds the credential; Redis enforces the expiry via `SET .. EX`.
//! `ConnectionManager` reconnects on its own, so a restarted Redis only costs
//! the requests that were in flight.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::error::GatewayError;
use crate::session::store::SessionStore;

#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
    key: String,
}

impl RedisSessionStore {
    pub async fn connect(url: &str, key: impl Into<String>) -> Result<Self, GatewayError> {
        let client = redis::Client::open(url).map_err(store_error)?;
        let conn = ConnectionManager::new(client).await.map_err(store_error)?;
        let key = key.into();
        tracing::info!(key = %key, "Connected to Redis session store");
        Ok(Self { conn, key })
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

fn store_error(e: redis::RedisError) -> GatewayError {
    tracing::error!(error = %e, "Redis session store error");
    GatewayError::StoreUnavailable(e.to_string())
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self) -> Result<Option<String>, GatewayError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(&self.key).await.map_err(store_error)?;
        Ok(value)
    }

    async fn put(&self, token: &str, ttl: Duration) -> Result<(), GatewayError> {
        // EX 0 is rejected by Redis; round sub-second TTLs up.
        let seconds = ttl.as_secs().max(1);
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(&self.key, token, seconds)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), GatewayError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
