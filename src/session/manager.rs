//! Session lifecycle: single-flight login and re-authentication.
//!
//! # Single-flight
//! ```text
//! ensure_session():
//!     store has token → done
//!     lock login mutex
//!         store has token now → done (someone else logged in)
//!         login, write store
//!     unlock
//!
//! force_reauthenticate(stale):
//!     lock login mutex
//!         store token present and != stale → done (already replaced)
//!         login, write store
//!     unlock
//! ```
//!
//! Every finished login attempt bumps a round counter. A caller that queued
//! on the mutex while a login was running shares that login's outcome: on
//! success it finds the new token, on failure it gets the same error rather
//! than sending the credentials again.
//!
//! The locked section runs in its own task. A caller that goes away while
//! waiting does not abort a login half-way; the login completes and the next
//! waiter sees its result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::error::GatewayError;
use crate::observability::metrics;
use crate::resilience::ResilientTransport;
use crate::session::store::SessionStore;
use crate::upstream::{Credentials, UpstreamClient};

#[derive(Debug, Clone)]
enum LoginMode {
    /// Log in only when the store holds no usable session.
    IfAbsent,
    /// Log in unless the store already holds a session other than this one.
    Replace(String),
    Always,
}

/// Outcome of the most recent login attempt, guarded by the login mutex.
#[derive(Default)]
struct LoginRound {
    failure: Option<GatewayError>,
}

struct Inner {
    store: Arc<dyn SessionStore>,
    client: UpstreamClient,
    transport: ResilientTransport,
    credentials: Credentials,
    ttl: Duration,
    login_lock: Mutex<LoginRound>,
    /// Finished login attempts; only written while `login_lock` is held.
    rounds: AtomicU64,
}

/// Owner of the shared upstream session. Cheap to clone.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        client: UpstreamClient,
        transport: ResilientTransport,
        credentials: Credentials,
        ttl: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                client,
                transport,
                credentials,
                ttl,
                login_lock: Mutex::new(LoginRound::default()),
                rounds: AtomicU64::new(0),
            }),
        }
    }

    /// Make sure a session exists, logging in at most once across all callers.
    pub async fn ensure_session(&self) -> Result<(), GatewayError> {
        if self.current_token().await?.is_some() {
            return Ok(());
        }
        self.single_flight(LoginMode::IfAbsent).await
    }

    /// Replace a session the upstream rejected.
    ///
    /// Callers that saw the same rejected session share one login; a caller
    /// whose stale session was already replaced does not log in again.
    pub async fn force_reauthenticate(&self, stale: &str) -> Result<(), GatewayError> {
        self.single_flight(LoginMode::Replace(stale.to_string())).await
    }

    /// Log in now, replacing whatever session is stored.
    pub async fn login(&self) -> Result<(), GatewayError> {
        self.single_flight(LoginMode::Always).await
    }

    /// Stored session, if any. An empty value counts as no session.
    pub async fn current_token(&self) -> Result<Option<String>, GatewayError> {
        Ok(self.inner.store.get().await?.filter(|t| !t.is_empty()))
    }

    pub async fn has_session(&self) -> Result<bool, GatewayError> {
        Ok(self.current_token().await?.is_some())
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.inner.store
    }

    async fn single_flight(&self, mode: LoginMode) -> Result<(), GatewayError> {
        let seen_round = self.inner.rounds.load(Ordering::Acquire);
        let manager = self.clone();
        tokio::spawn(async move { manager.login_exclusive(mode, seen_round).await })
            .await
            .map_err(|e| GatewayError::Internal(format!("login task failed: {}", e)))?
    }

    async fn login_exclusive(&self, mode: LoginMode, seen_round: u64) -> Result<(), GatewayError> {
        let mut round = self.inner.login_lock.lock().await;

        if self.inner.rounds.load(Ordering::Acquire) != seen_round {
            if let Some(err) = &round.failure {
                tracing::debug!(error = %err, "Sharing the failed login of a concurrent caller");
                return Err(err.clone());
            }
        }

        let current = self.current_token().await?;
        match (&mode, current) {
            (LoginMode::IfAbsent, Some(_)) => {
                tracing::debug!("Session established by a concurrent caller");
                return Ok(());
            }
            (LoginMode::Replace(stale), Some(token)) if token != *stale => {
                tracing::debug!("Session already replaced by a concurrent caller");
                return Ok(());
            }
            _ => {}
        }

        if matches!(mode, LoginMode::Replace(_)) {
            tracing::info!("Upstream rejected the session, re-authenticating");
            metrics::record_reauthentication();
        }

        let result = self.perform_login().await;
        round.failure = result.as_ref().err().cloned();
        self.inner.rounds.fetch_add(1, Ordering::Release);
        result
    }

    async fn perform_login(&self) -> Result<(), GatewayError> {
        let inner = &self.inner;
        let response = match inner
            .transport
            .execute("login", || inner.client.login(&inner.credentials))
            .await
        {
            Ok(response) => response,
            Err(e) => {
                metrics::record_login("unavailable");
                tracing::error!(error = %e, "Upstream login could not be completed");
                return Err(e);
            }
        };

        if !response.is_success() {
            metrics::record_login("rejected");
            tracing::error!(status = %response.status, "Upstream rejected the login");
            return Err(GatewayError::LoginFailed(format!(
                "upstream answered {}",
                response.status
            )));
        }

        let Some(cookie) = response.session_cookie() else {
            metrics::record_login("rejected");
            tracing::error!("Login response carried no session cookies");
            return Err(GatewayError::LoginFailed(
                "login response did not contain session cookies".to_string(),
            ));
        };

        inner.store.put(&cookie, inner.ttl).await?;
        metrics::record_login("success");
        tracing::info!(
            tenant = %inner.credentials.tenant,
            ttl_secs = inner.ttl.as_secs(),
            "Upstream session established"
        );
        Ok(())
    }
}
